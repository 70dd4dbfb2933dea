//! Derived metrics over domain payloads: trends, comparisons and ratios.
//!
//! The enricher does not know the exact shape of a provider payload. It walks
//! the JSON tree and recognises three patterns:
//!
//! - numeric series: arrays of numbers, or of objects carrying a `value`,
//!   `amount` or `count` field (at least two points)
//! - comparisons: a `previous` (or `prior`) object next to current fields of
//!   the same name, or a `{ "current": x, "previous": y }` object
//! - well-known fields (`revenue`, `orders`, `on_time`, ...) used for ratios

use crate::core::score::round2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key under which derived metrics are attached to a payload
pub const DERIVED_KEY: &str = "_derived";

const PREVIOUS_KEYS: &[&str] = &["previous", "prior"];
const POINT_FIELDS: &[&str] = &["value", "amount", "count", "total"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
            TrendDirection::Flat => write!(f, "flat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub metric: String,
    pub direction: TrendDirection,
    /// First to last point, in percent; absent when the series starts at 0
    pub percent_change: Option<f64>,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub metric: String,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub percent_change: Option<f64>,
}

/// Everything the enricher derived from one payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub trends: Vec<Trend>,
    pub comparisons: Vec<Comparison>,
    /// Domain ratios such as `average_order_value` or `on_time_rate`
    pub metrics: BTreeMap<String, f64>,
}

impl EnrichmentReport {
    pub fn is_empty(&self) -> bool {
        self.trends.is_empty() && self.comparisons.is_empty() && self.metrics.is_empty()
    }

    /// Attach the report under `_derived` when the payload is an object
    pub fn attach(&self, payload: &mut Value) {
        if self.is_empty() {
            return;
        }
        if let Value::Object(map) = payload
            && let Ok(report) = serde_json::to_value(self)
        {
            map.insert(DERIVED_KEY.to_string(), report);
        }
    }

    /// Merge another report, prefixing its metric names
    pub fn merge_prefixed(&mut self, prefix: &str, other: EnrichmentReport) {
        let name = |metric: String| format!("{}.{}", prefix, metric);
        self.trends.extend(other.trends.into_iter().map(|mut t| {
            t.metric = name(t.metric);
            t
        }));
        self.comparisons
            .extend(other.comparisons.into_iter().map(|mut c| {
                c.metric = name(c.metric);
                c
            }));
        self.metrics
            .extend(other.metrics.into_iter().map(|(k, v)| (name(k), v)));
    }

    /// Short human-readable lines, one per finding
    pub fn highlights(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for trend in &self.trends {
            match trend.percent_change {
                Some(pct) => lines.push(format!(
                    "{} trending {} ({:+.1}% over {} points)",
                    trend.metric, trend.direction, pct, trend.points
                )),
                None => lines.push(format!("{} trending {}", trend.metric, trend.direction)),
            }
        }
        for comparison in &self.comparisons {
            match comparison.percent_change {
                Some(pct) => lines.push(format!(
                    "{}: {} vs {} previously ({:+.1}%)",
                    comparison.metric, comparison.current, comparison.previous, pct
                )),
                None => lines.push(format!(
                    "{}: {} vs {} previously",
                    comparison.metric, comparison.current, comparison.previous
                )),
            }
        }
        for (metric, value) in &self.metrics {
            lines.push(format!("{} = {}", metric, value));
        }
        lines
    }
}

/// A ratio between two well-known payload fields
struct Ratio {
    name: &'static str,
    numerator: &'static [&'static str],
    denominator: &'static [&'static str],
}

const RATIOS: &[Ratio] = &[
    Ratio {
        name: "average_order_value",
        numerator: &["revenue", "total_revenue", "sales", "total_sales"],
        denominator: &["orders", "order_count", "total_orders"],
    },
    Ratio {
        name: "on_time_rate",
        numerator: &["on_time", "on_time_deliveries", "delivered_on_time"],
        denominator: &["delivered", "deliveries", "total_deliveries", "delivery_count"],
    },
    Ratio {
        name: "profit_margin",
        numerator: &["profit", "net_profit", "gross_profit"],
        denominator: &["revenue", "total_revenue", "sales", "total_sales"],
    },
    Ratio {
        name: "delay_rate",
        numerator: &["delayed", "delayed_shipments", "late_shipments"],
        denominator: &["shipments", "total_shipments", "shipment_count"],
    },
    Ratio {
        name: "stock_out_rate",
        numerator: &["out_of_stock", "stock_outs", "stockouts"],
        denominator: &["products", "total_products", "sku_count", "skus"],
    },
];

/// Stateless payload enricher
#[derive(Debug, Clone)]
pub struct Enricher {
    /// Percent change under which a series counts as flat
    flat_threshold: f64,
}

impl Default for Enricher {
    fn default() -> Self {
        Self {
            flat_threshold: 2.0,
        }
    }
}

impl Enricher {
    pub fn new(flat_threshold: f64) -> Self {
        Self {
            flat_threshold: flat_threshold.abs(),
        }
    }

    pub fn enrich(&self, payload: &Value) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();
        self.walk(payload, "", &mut report);
        for ratio in RATIOS {
            if let Some(value) = ratio_value(payload, ratio) {
                report.metrics.insert(ratio.name.to_string(), value);
            }
        }
        report
    }

    /// Enrich a payload in place, returning what was attached
    pub fn enrich_in_place(&self, payload: &mut Value) -> EnrichmentReport {
        let report = self.enrich(payload);
        report.attach(payload);
        report
    }

    fn walk(&self, value: &Value, path: &str, report: &mut EnrichmentReport) {
        match value {
            Value::Object(map) => {
                if let Some(comparison) = current_previous_pair(path, map) {
                    report.comparisons.push(comparison);
                    return;
                }
                if let Some(previous) = PREVIOUS_KEYS
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_object))
                {
                    report.comparisons.extend(sibling_comparisons(path, map, previous));
                }
                for (key, child) in map {
                    if key == DERIVED_KEY || PREVIOUS_KEYS.contains(&key.as_str()) {
                        continue;
                    }
                    self.walk(child, &join(path, key), report);
                }
            }
            Value::Array(items) => {
                if let Some(points) = series_points(items) {
                    report.trends.push(self.trend(path, &points));
                } else {
                    for item in items.iter().filter(|i| i.is_object()) {
                        self.walk(item, path, report);
                    }
                }
            }
            _ => {}
        }
    }

    fn trend(&self, metric: &str, points: &[f64]) -> Trend {
        let first = points[0];
        let last = points[points.len() - 1];
        let percent_change = percent(last, first);
        let direction = match percent_change {
            Some(pct) if pct > self.flat_threshold => TrendDirection::Up,
            Some(pct) if pct < -self.flat_threshold => TrendDirection::Down,
            Some(_) => TrendDirection::Flat,
            None if last > first => TrendDirection::Up,
            None if last < first => TrendDirection::Down,
            None => TrendDirection::Flat,
        };
        Trend {
            metric: metric_name(metric),
            direction,
            percent_change,
            mean: round2(points.iter().sum::<f64>() / points.len() as f64),
            min: points.iter().copied().fold(f64::INFINITY, f64::min),
            max: points.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            points: points.len(),
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn metric_name(path: &str) -> String {
    if path.is_empty() {
        "value".to_string()
    } else {
        path.to_string()
    }
}

fn percent(current: f64, previous: f64) -> Option<f64> {
    (previous != 0.0).then(|| round2((current - previous) / previous.abs() * 100.0))
}

fn comparison(metric: String, current: f64, previous: f64) -> Comparison {
    Comparison {
        metric,
        current,
        previous,
        change: round2(current - previous),
        percent_change: percent(current, previous),
    }
}

fn current_previous_pair(path: &str, map: &Map<String, Value>) -> Option<Comparison> {
    let current = map.get("current")?.as_f64()?;
    let previous = PREVIOUS_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_f64))?;
    Some(comparison(metric_name(path), current, previous))
}

fn sibling_comparisons(
    path: &str,
    current: &Map<String, Value>,
    previous: &Map<String, Value>,
) -> Vec<Comparison> {
    previous
        .iter()
        .filter_map(|(key, prev)| {
            let prev = prev.as_f64()?;
            let now = current.get(key)?.as_f64()?;
            Some(comparison(join(path, key), now, prev))
        })
        .collect()
}

fn series_points(items: &[Value]) -> Option<Vec<f64>> {
    if items.len() < 2 {
        return None;
    }
    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => n.as_f64(),
            Value::Object(map) => POINT_FIELDS
                .iter()
                .find_map(|f| map.get(*f).and_then(Value::as_f64)),
            _ => None,
        })
        .collect()
}

/// First numeric field named like one of `names`, searched breadth-first and
/// never inside `previous` snapshots or derived data
pub fn find_number(payload: &Value, names: &[&str]) -> Option<f64> {
    let mut queue = vec![payload];
    while !queue.is_empty() {
        let mut next = Vec::new();
        for value in queue {
            let Value::Object(map) = value else {
                continue;
            };
            if let Some(found) = names
                .iter()
                .find_map(|n| map.get(*n).and_then(Value::as_f64))
            {
                return Some(found);
            }
            for (key, child) in map {
                if key != DERIVED_KEY && !PREVIOUS_KEYS.contains(&key.as_str()) {
                    next.push(child);
                }
            }
        }
        queue = next;
    }
    None
}

fn ratio_value(payload: &Value, ratio: &Ratio) -> Option<f64> {
    let numerator = find_number(payload, ratio.numerator)?;
    let denominator = find_number(payload, ratio.denominator)?;
    (denominator > 0.0).then(|| round2(numerator / denominator))
}
