//! Equality filters over record arrays.
//!
//! A payload is an object whose array fields hold records (objects). Records
//! carrying a `status`, an identifier or a date are matched against the
//! query filters; records without the field are kept. Aggregates next to
//! the arrays are left untouched.

use chrono::NaiveDate;
use insight_domain::QueryFilters;
use serde_json::{Map, Value};

const ID_FIELDS: &[&str] = &["id", "order_id", "shipment_id", "invoice_id", "tracking_number"];
const DATE_FIELDS: &[&str] = &["date", "created_at", "order_date", "shipped_at", "delivered_at"];

/// Filter every record array of `payload`
pub fn apply(payload: &Value, filters: &QueryFilters) -> Value {
    if filters.statuses.is_empty()
        && filters.identifiers.is_empty()
        && filters.date_range.is_none()
        && filters.limit.is_none()
    {
        return payload.clone();
    }

    match payload {
        Value::Array(records) => Value::Array(filter_records(records, filters)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::Array(records) if records.iter().all(Value::is_object) => {
                            Value::Array(filter_records(records, filters))
                        }
                        other => other.clone(),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn filter_records(records: &[Value], filters: &QueryFilters) -> Vec<Value> {
    let kept = records.iter().filter(|record| match record {
        Value::Object(fields) => matches(fields, filters),
        _ => true,
    });
    match filters.limit {
        Some(limit) => kept.take(limit).cloned().collect(),
        None => kept.cloned().collect(),
    }
}

fn matches(record: &Map<String, Value>, filters: &QueryFilters) -> bool {
    if !filters.statuses.is_empty()
        && let Some(status) = record.get("status").and_then(Value::as_str)
    {
        let status = status.to_lowercase().replace(['_', '-'], " ");
        if !filters.statuses.iter().any(|s| *s == status) {
            return false;
        }
    }

    if !filters.identifiers.is_empty()
        && let Some(id) = first_field(record, ID_FIELDS)
    {
        let id = scalar_text(id);
        if !filters
            .identifiers
            .iter()
            .any(|wanted| id == *wanted || id.ends_with(&format!("-{}", wanted)))
        {
            return false;
        }
    }

    if let Some(range) = &filters.date_range
        && let Some(date) = first_field(record, DATE_FIELDS)
            .and_then(Value::as_str)
            .and_then(parse_date)
        && !range.contains(date)
    {
        return false;
    }

    true
}

fn first_field<'a>(record: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| record.get(*name))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `YYYY-MM-DD`, optionally followed by a time
fn parse_date(text: &str) -> Option<NaiveDate> {
    text.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}
