//! Token extraction from free-text answers: dates, money, percentages, counts.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));

static US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("valid regex"));

static LONG_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
    )
    .expect("valid regex")
});

static CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\$|€|£|\busd\s?)\s?(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d+))?(?:\s?(k|m|bn|b|thousand|million|billion)\b)?",
    )
    .expect("valid regex")
});

static PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s?(?:%|percent\b)").expect("valid regex")
});

static COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^$€£\d.,])(\d{1,3}(?:,\d{3})+|\d+)\s+(?:[a-z-]+\s+)?(orders?|shipments?|deliveries|delivery|customers?|invoices?|payments?|items?|units?|packages?|records?|products?|returns?)\b",
    )
    .expect("valid regex")
});

fn month_number(prefix: &str) -> Option<u32> {
    let month = match prefix.to_lowercase().get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn parse_number(digits: &str) -> Option<f64> {
    digits.replace(',', "").parse().ok()
}

/// Calendar dates mentioned in `text`, in order of appearance per format.
///
/// Tokens that look like dates but are not valid calendar days are skipped.
pub fn extract_dates(text: &str) -> Vec<NaiveDate> {
    let mut dates = Vec::new();

    for caps in ISO_DATE.captures_iter(text) {
        if let (Ok(y), Ok(m), Ok(d)) = (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        )
            && let Some(date) = NaiveDate::from_ymd_opt(y, m, d)
        {
            dates.push(date);
        }
    }

    for caps in US_DATE.captures_iter(text) {
        if let (Ok(m), Ok(d), Ok(y)) = (
            caps[1].parse::<u32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<i32>(),
        )
            && let Some(date) = NaiveDate::from_ymd_opt(y, m, d)
        {
            dates.push(date);
        }
    }

    for caps in LONG_DATE.captures_iter(text) {
        if let Some(m) = month_number(&caps[1])
            && let (Ok(d), Ok(y)) = (caps[2].parse::<u32>(), caps[3].parse::<i32>())
            && let Some(date) = NaiveDate::from_ymd_opt(y, m, d)
        {
            dates.push(date);
        }
    }

    dates
}

/// Monetary amounts, with `k`/`m`/`b` style suffixes expanded
pub fn extract_currency(text: &str) -> Vec<f64> {
    CURRENCY
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = parse_number(&caps[1])?;
            let fraction = caps
                .get(2)
                .and_then(|m| format!("0.{}", m.as_str()).parse::<f64>().ok())
                .unwrap_or(0.0);
            let multiplier = match caps.get(3).map(|m| m.as_str().to_lowercase()).as_deref() {
                Some("k" | "thousand") => 1_000.0,
                Some("m" | "million") => 1_000_000.0,
                Some("b" | "bn" | "billion") => 1_000_000_000.0,
                _ => 1.0,
            };
            Some((whole + fraction) * multiplier)
        })
        .collect()
}

pub fn extract_percentages(text: &str) -> Vec<f64> {
    PERCENT
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Canonical singular unit for a counted noun
fn unit_of(noun: &str) -> String {
    let noun = noun.to_lowercase();
    match noun.as_str() {
        "deliveries" => "delivery".to_string(),
        _ => noun.strip_suffix('s').unwrap_or(&noun).to_string(),
    }
}

/// Counts keyed by unit ("order", "shipment", ...); the largest count per
/// unit is kept as the headline figure.
pub fn extract_counts(text: &str) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    for caps in COUNT.captures_iter(text) {
        let Some(value) = parse_number(&caps[1]) else {
            continue;
        };
        let unit = unit_of(&caps[2]);
        let entry = counts.entry(unit).or_insert(value);
        if value > *entry {
            *entry = value;
        }
    }
    counts
}

/// Every numeric token the critic cares about, for one answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFigures {
    pub dates: Vec<NaiveDate>,
    pub currency: Vec<f64>,
    pub percentages: Vec<f64>,
    pub counts: BTreeMap<String, f64>,
}

impl ExtractedFigures {
    pub fn from_text(text: &str) -> Self {
        Self {
            dates: extract_dates(text),
            currency: extract_currency(text),
            percentages: extract_percentages(text),
            counts: extract_counts(text),
        }
    }

    /// Largest monetary amount: the figure an answer leads with
    pub fn headline_currency(&self) -> Option<f64> {
        self.currency.iter().copied().reduce(f64::max)
    }

    pub fn has_figures(&self) -> bool {
        !self.currency.is_empty() || !self.percentages.is_empty() || !self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_dates_in_all_formats() {
        let dates = extract_dates("Shipped 2024-03-05, invoiced 03/07/2024 and paid on March 9, 2024.");
        assert_eq!(dates, vec![date(2024, 3, 5), date(2024, 3, 7), date(2024, 3, 9)]);
    }

    #[test]
    fn test_invalid_dates_are_skipped() {
        assert!(extract_dates("2024-13-45 and 02/30/2024").is_empty());
    }

    #[test]
    fn test_extract_currency_with_suffixes() {
        let values = extract_currency("Revenue was $1,250.50 last week and $2.5M this quarter (USD 300k).");
        assert_eq!(values, vec![1250.5, 2_500_000.0, 300_000.0]);
    }

    #[test]
    fn test_extract_percentages() {
        assert_eq!(
            extract_percentages("On-time rate 92.5% up from 88 percent"),
            vec![92.5, 88.0]
        );
    }

    #[test]
    fn test_extract_counts_by_unit() {
        let counts = extract_counts("We found 42 orders, 1,200 shipped items and 3 late deliveries.");
        assert_eq!(counts.get("order"), Some(&42.0));
        assert_eq!(counts.get("item"), Some(&1200.0));
        assert_eq!(counts.get("delivery"), Some(&3.0));
    }

    #[test]
    fn test_currency_is_not_counted() {
        let counts = extract_counts("$40 orders were refunded");
        assert!(counts.is_empty());
    }

    #[test]
    fn test_headline_currency() {
        let figures = ExtractedFigures::from_text("Total $10,000 with $250 in fees");
        assert_eq!(figures.headline_currency(), Some(10_000.0));
        assert!(figures.has_figures());
        assert!(!ExtractedFigures::from_text("nothing here").has_figures());
    }
}
