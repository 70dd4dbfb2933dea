//! Filters extracted from a business question.
//!
//! The data provider receives these as opaque criteria; the orchestrator
//! never builds storage queries itself.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LAST_N_DAYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:last|past|previous)\s+(\d{1,4})\s+(day|week|month)s?\b")
        .expect("valid regex")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid regex"));

static HASH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d{2,})\b").expect("valid regex"));

static PREFIXED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2,5}-\d{2,})\b").expect("valid regex"));

static LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:top|first|limit)\s+(\d{1,4})\b").expect("valid regex")
});

const STATUS_WORDS: &[&str] = &[
    "pending",
    "processing",
    "shipped",
    "in transit",
    "delivered",
    "cancelled",
    "returned",
    "paid",
    "unpaid",
    "overdue",
    "refunded",
    "delayed",
    "completed",
    "open",
    "closed",
    "failed",
];

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "what", "which", "who", "how", "many", "much",
    "with", "from", "that", "this", "these", "those", "have", "has", "had", "our", "your",
    "there", "their", "into", "about", "over", "show", "give", "tell", "list", "please", "can",
    "you", "all", "any", "did", "does", "not", "last", "past", "month", "week", "year", "day",
    "days", "today", "yesterday", "between", "top", "first",
];

/// What the question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    Count,
    Total,
    Trend,
    Compare,
    Status,
    List,
    #[default]
    General,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Count => "count",
            QueryIntent::Total => "total",
            QueryIntent::Trend => "trend",
            QueryIntent::Compare => "compare",
            QueryIntent::Status => "status",
            QueryIntent::List => "list",
            QueryIntent::General => "general",
        }
    }

    fn detect(normalized: &str) -> Self {
        let padded = format!(" {} ", normalized);
        let has = |phrases: &[&str]| phrases.iter().any(|p| padded.contains(&format!(" {} ", p)));
        if has(&["compare", "compared", "versus", "vs", "against"]) {
            QueryIntent::Compare
        } else if has(&["trend", "trends", "over time", "growth", "growing", "declining"]) {
            QueryIntent::Trend
        } else if has(&["how many", "number of", "count"]) {
            QueryIntent::Count
        } else if has(&["total", "sum", "how much", "revenue"]) {
            QueryIntent::Total
        } else if has(&["status", "where is", "track", "tracking"]) {
            QueryIntent::Status
        } else if has(&["list", "show", "which"]) {
            QueryIntent::List
        } else {
            QueryIntent::General
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub label: String,
}

impl DateRange {
    fn new(from: NaiveDate, to: NaiveDate, label: impl Into<String>) -> Self {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        Self {
            from,
            to,
            label: label.into(),
        }
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Criteria extracted from the question text
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub intent: QueryIntent,
    /// Content words left after removing stopwords
    #[serde(default)]
    pub terms: Vec<String>,
}

impl QueryFilters {
    /// Parse a question relative to `today`
    pub fn parse(text: &str, today: NaiveDate) -> Self {
        let normalized = crate::agent::knowledge::normalize_text(text);
        let padded = format!(" {} ", normalized);

        let statuses = STATUS_WORDS
            .iter()
            .filter(|s| padded.contains(&format!(" {} ", s)))
            .map(|s| s.to_string())
            .collect();

        let mut identifiers: Vec<String> = HASH_ID
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect();
        identifiers.extend(PREFIXED_ID.captures_iter(text).map(|c| c[1].to_string()));

        let limit = LIMIT.captures(text).and_then(|c| c[1].parse().ok());

        let terms = normalized
            .split_whitespace()
            .filter(|w| {
                w.len() >= 3 && !STOPWORDS.contains(w) && !w.chars().all(|c| c.is_ascii_digit())
            })
            .map(str::to_string)
            .collect();

        Self {
            date_range: parse_date_range(text, &normalized, today),
            statuses,
            identifiers,
            limit,
            intent: QueryIntent::detect(&normalized),
            terms,
        }
    }

    /// A question with no content words cannot be answered
    pub fn is_answerable(&self) -> bool {
        !self.terms.is_empty() || !self.identifiers.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.date_range.is_none()
            && self.statuses.is_empty()
            && self.identifiers.is_empty()
            && self.limit.is_none()
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn previous_month(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let this_start = month_start(date);
    let last_end = this_start - Duration::days(1);
    (month_start(last_end), last_end)
}

fn year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

fn parse_date_range(text: &str, normalized: &str, today: NaiveDate) -> Option<DateRange> {
    let mut iso: Vec<NaiveDate> = ISO_DATE
        .captures_iter(text)
        .filter_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
        .collect();
    iso.sort();
    if let (Some(first), Some(last)) = (iso.first(), iso.last()) {
        let label = if first == last {
            first.to_string()
        } else {
            format!("{} to {}", first, last)
        };
        return Some(DateRange::new(*first, *last, label));
    }

    if let Some(caps) = LAST_N_DAYS.captures(text)
        && let Ok(n) = caps[1].parse::<i64>()
    {
        let unit = caps[2].to_lowercase();
        let days = match unit.as_str() {
            "week" => n * 7,
            "month" => n * 30,
            _ => n,
        };
        let label = format!("last {} {}s", n, unit);
        return Some(DateRange::new(today - Duration::days(days), today, label));
    }

    let padded = format!(" {} ", normalized);
    let has = |phrase: &str| padded.contains(&format!(" {} ", phrase));

    if has("today") {
        return Some(DateRange::new(today, today, "today"));
    }
    if has("yesterday") {
        let day = today - Duration::days(1);
        return Some(DateRange::new(day, day, "yesterday"));
    }
    if has("this week") {
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        return Some(DateRange::new(monday, today, "this week"));
    }
    if has("last week") || has("past week") {
        return Some(DateRange::new(today - Duration::days(7), today, "last week"));
    }
    if has("this month") {
        return Some(DateRange::new(month_start(today), today, "this month"));
    }
    if has("last month") || has("previous month") {
        let (from, to) = previous_month(today);
        return Some(DateRange::new(from, to, "last month"));
    }
    if has("this year") || has("ytd") || has("year to date") {
        let from = year_start(today.year())?;
        return Some(DateRange::new(from, today, "this year"));
    }
    if has("last year") {
        let from = year_start(today.year() - 1)?;
        let to = year_start(today.year())? - Duration::days(1);
        return Some(DateRange::new(from, to, "last year"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        // a Wednesday
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_last_n_days() {
        let filters = QueryFilters::parse("How many orders in the last 30 days?", today());
        let range = filters.date_range.unwrap();
        assert_eq!(range.from, date(2024, 5, 13));
        assert_eq!(range.to, today());
        assert_eq!(range.label, "last 30 days");
        assert_eq!(filters.intent, QueryIntent::Count);
        assert_eq!(filters.limit, None);
    }

    #[test]
    fn test_calendar_ranges() {
        let this_week = QueryFilters::parse("shipments this week", today()).date_range.unwrap();
        assert_eq!(this_week.from, date(2024, 6, 10));

        let last_month = QueryFilters::parse("revenue last month", today()).date_range.unwrap();
        assert_eq!(last_month.from, date(2024, 5, 1));
        assert_eq!(last_month.to, date(2024, 5, 31));
        assert_eq!(last_month.days(), 31);

        let last_year = QueryFilters::parse("profit last year", today()).date_range.unwrap();
        assert_eq!(last_year.from, date(2023, 1, 1));
        assert_eq!(last_year.to, date(2023, 12, 31));
    }

    #[test]
    fn test_explicit_dates() {
        let filters =
            QueryFilters::parse("Compare deliveries between 2024-05-20 and 2024-05-01", today());
        let range = filters.date_range.unwrap();
        assert_eq!(range.from, date(2024, 5, 1));
        assert_eq!(range.to, date(2024, 5, 20));
        assert!(range.contains(date(2024, 5, 10)));
        assert_eq!(filters.intent, QueryIntent::Compare);
    }

    #[test]
    fn test_statuses_identifiers_and_limit() {
        let filters = QueryFilters::parse(
            "List the top 5 pending or delayed shipments for ORD-1234 and #5678",
            today(),
        );
        assert_eq!(filters.statuses, vec!["pending", "delayed"]);
        assert_eq!(filters.identifiers, vec!["5678", "ORD-1234"]);
        assert_eq!(filters.limit, Some(5));
        assert_eq!(filters.intent, QueryIntent::List);
        assert!(filters.terms.contains(&"shipments".to_string()));
    }

    #[test]
    fn test_unanswerable_queries() {
        assert!(!QueryFilters::parse("", today()).is_answerable());
        assert!(!QueryFilters::parse("?? !!", today()).is_answerable());
        assert!(!QueryFilters::parse("what are the", today()).is_answerable());
        assert!(QueryFilters::parse("#1234", today()).is_answerable());
    }

    #[test]
    fn test_no_filters() {
        let filters = QueryFilters::parse("revenue trend", today());
        assert!(filters.is_empty());
        assert_eq!(filters.intent, QueryIntent::Trend);
    }
}
