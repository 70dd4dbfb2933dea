//! Cross-validation of candidate answers.
//!
//! The [`Critic`] is a pure function over one answer set. It runs four
//! independent checks (temporal, data availability, numeric and business
//! rules), each starting at 1.0 and losing a fixed penalty per finding.
//! The overall score is the mean of the four, except that a found/no-data
//! split caps it at the data-availability score: two answers that disagree
//! on whether any data exists cannot both be right, whatever else they say.

use super::extract::ExtractedFigures;
use super::result::{Inconsistency, ValidationCategory, ValidationResult};
use super::rules::{
    ANTONYM_PAIRS, FOUND_DATA_PHRASES, NO_DATA_PHRASES, SEQUENCING_RULES, recommendations_for,
};
use crate::agent::knowledge::normalize_text;
use crate::agent::{AgentResponse, DomainTag};
use crate::core::error::OrchestrationError;
use chrono::{NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Penalties and thresholds of the consistency checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticConfig {
    /// Answers with text needed before cross-validation runs
    pub min_sources: usize,
    pub temporal_penalty: f64,
    /// Date-count gap from the mean of the other answers that gets flagged
    pub date_divergence: f64,
    pub future_horizon_days: i64,
    pub availability_penalty: f64,
    pub contradiction_penalty: f64,
    pub numeric_penalty: f64,
    /// Relative spread `(max - min) / max` above which figures disagree
    pub numeric_spread: f64,
    pub rule_penalty: f64,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            min_sources: 2,
            temporal_penalty: 0.2,
            date_divergence: 3.0,
            future_horizon_days: 365,
            availability_penalty: 0.25,
            contradiction_penalty: 0.1,
            numeric_penalty: 0.3,
            numeric_spread: 0.5,
            rule_penalty: 0.2,
        }
    }
}

impl CriticConfig {
    /// Latest plausible date relative to `today`, saturating at the
    /// calendar bounds
    pub fn future_horizon(&self, today: NaiveDate) -> NaiveDate {
        let days = self.future_horizon_days;
        TimeDelta::try_days(days)
            .and_then(|delta| today.checked_add_signed(delta))
            .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
    }
}

/// One answer prepared for checking
struct Source<'a> {
    tag: &'a DomainTag,
    text: &'a str,
    padded: String,
    figures: ExtractedFigures,
}

impl<'a> Source<'a> {
    fn new(tag: &'a DomainTag, text: &'a str) -> Self {
        Self {
            tag,
            text,
            padded: pad(text),
            figures: ExtractedFigures::from_text(text),
        }
    }

    fn has(&self, phrase: &str) -> bool {
        has_phrase(&self.padded, phrase)
    }
}

fn pad(text: &str) -> String {
    format!(" {} ", normalize_text(text))
}

fn has_phrase(padded: &str, phrase: &str) -> bool {
    padded.contains(&format!(" {} ", phrase))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Availability {
    NoData,
    Found,
    Unknown,
}

struct CategoryOutcome {
    score: f64,
    issues: Vec<Inconsistency>,
}

impl CategoryOutcome {
    fn new(penalty_total: f64, issues: Vec<Inconsistency>) -> Self {
        Self {
            score: (1.0 - penalty_total).max(0.0),
            issues,
        }
    }
}

/// Stateless answer-set validator
#[derive(Debug, Clone, Default)]
pub struct Critic {
    config: CriticConfig,
}

impl Critic {
    pub fn new(config: CriticConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CriticConfig {
        &self.config
    }

    /// Validate an answer set against today's date.
    ///
    /// Never fails: too few usable answers yield a neutral, non cross-validated
    /// result.
    pub fn validate(&self, responses: &[AgentResponse]) -> ValidationResult {
        self.validate_at(responses, Utc::now().date_naive())
    }

    pub fn validate_at(&self, responses: &[AgentResponse], today: NaiveDate) -> ValidationResult {
        match self.cross_check(responses, today) {
            Ok(result) => result,
            Err(OrchestrationError::ValidationInput { actual, .. }) => {
                ValidationResult::single_source(actual)
            }
            Err(_) => ValidationResult::single_source(0),
        }
    }

    /// Cross-check the answers that carry text.
    ///
    /// Returns [`OrchestrationError::ValidationInput`] when fewer than
    /// `min_sources` answers can be compared.
    pub fn cross_check(
        &self,
        responses: &[AgentResponse],
        today: NaiveDate,
    ) -> Result<ValidationResult, OrchestrationError> {
        let sources: Vec<Source<'_>> = responses
            .iter()
            .filter_map(|r| r.usable_text().map(|text| Source::new(r.agent_tag(), text)))
            .collect();

        let required = self.config.min_sources.max(2);
        if sources.len() < required {
            return Err(OrchestrationError::ValidationInput {
                required,
                actual: sources.len(),
            });
        }

        let outcomes = [
            (ValidationCategory::Temporal, self.check_temporal(&sources, today)),
            (
                ValidationCategory::DataAvailability,
                self.check_availability(&sources),
            ),
            (ValidationCategory::Numeric, self.check_numeric(&sources)),
            (
                ValidationCategory::BusinessRules,
                self.check_business_rules(&sources),
            ),
        ];

        let category_scores: BTreeMap<ValidationCategory, f64> =
            outcomes.iter().map(|(c, o)| (*c, o.score)).collect();
        let mean = category_scores.values().sum::<f64>() / category_scores.len() as f64;

        let split = availability_split(&sources);
        let overall = if split {
            mean.min(category_scores[&ValidationCategory::DataAvailability])
        } else {
            mean
        };

        let inconsistencies: Vec<Inconsistency> =
            outcomes.into_iter().flat_map(|(_, o)| o.issues).collect();
        let recommendations = recommend(&inconsistencies, &category_scores);

        Ok(ValidationResult::new(
            overall,
            category_scores,
            inconsistencies,
            recommendations,
            sources.len(),
        ))
    }

    fn check_temporal(&self, sources: &[Source<'_>], today: NaiveDate) -> CategoryOutcome {
        let mut issues = Vec::new();
        let counts: Vec<f64> = sources.iter().map(|s| s.figures.dates.len() as f64).collect();
        let total: f64 = counts.iter().sum();
        let others = (sources.len() - 1) as f64;

        for (source, count) in sources.iter().zip(&counts) {
            let mean_others = (total - count) / others;
            if count - mean_others >= self.config.date_divergence {
                issues.push(Inconsistency::new(
                    ValidationCategory::Temporal,
                    format!(
                        "{} mentions {} dates while the other answers average {:.1}",
                        source.tag, count, mean_others
                    ),
                ));
            }
        }

        let horizon = self.config.future_horizon(today);
        for source in sources {
            if let Some(date) = source.figures.dates.iter().filter(|d| **d > horizon).max() {
                issues.push(Inconsistency::new(
                    ValidationCategory::Temporal,
                    format!(
                        "{} mentions {}, more than {} days in the future",
                        source.tag, date, self.config.future_horizon_days
                    ),
                ));
            }
        }

        CategoryOutcome::new(self.config.temporal_penalty * issues.len() as f64, issues)
    }

    fn check_availability(&self, sources: &[Source<'_>]) -> CategoryOutcome {
        let mut issues = Vec::new();
        let mut penalty = 0.0;

        let classes: Vec<Availability> = sources.iter().map(classify).collect();
        for (empty, empty_class) in sources.iter().zip(&classes) {
            if *empty_class != Availability::NoData {
                continue;
            }
            for (found, found_class) in sources.iter().zip(&classes) {
                if *found_class == Availability::Found {
                    penalty += self.config.availability_penalty;
                    issues.push(Inconsistency::new(
                        ValidationCategory::DataAvailability,
                        format!(
                            "{} reports no data while {} reports data for the same query",
                            empty.tag, found.tag
                        ),
                    ));
                }
            }
        }

        for (a, b) in ANTONYM_PAIRS {
            let uses_a = sources.iter().position(|s| s.has(a) && !s.has(b));
            let uses_b = sources.iter().position(|s| s.has(b) && !s.has(a));
            if let (Some(i), Some(j)) = (uses_a, uses_b)
                && i != j
            {
                penalty += self.config.contradiction_penalty;
                issues.push(Inconsistency::new(
                    ValidationCategory::DataAvailability,
                    format!(
                        "{} says '{}' while {} says '{}'",
                        sources[i].tag, a, sources[j].tag, b
                    ),
                ));
            }
        }

        CategoryOutcome::new(penalty, issues)
    }

    fn check_numeric(&self, sources: &[Source<'_>]) -> CategoryOutcome {
        let mut issues = Vec::new();

        let currency: Vec<(&DomainTag, f64)> = sources
            .iter()
            .filter_map(|s| s.figures.headline_currency().map(|v| (s.tag, v)))
            .collect();
        if let Some(message) = self.spread_issue(&currency, |v| format!("${:.2}", v)) {
            issues.push(Inconsistency::new(
                ValidationCategory::Numeric,
                format!("Currency figures disagree: {}", message),
            ));
        }

        let mut by_unit: BTreeMap<&str, Vec<(&DomainTag, f64)>> = BTreeMap::new();
        for source in sources {
            for (unit, value) in &source.figures.counts {
                by_unit
                    .entry(unit.as_str())
                    .or_default()
                    .push((source.tag, *value));
            }
        }
        for (unit, values) in &by_unit {
            if let Some(message) = self.spread_issue(values, |v| format!("{}", v)) {
                issues.push(Inconsistency::new(
                    ValidationCategory::Numeric,
                    format!("{} counts disagree: {}", unit, message),
                ));
            }
        }

        CategoryOutcome::new(self.config.numeric_penalty * issues.len() as f64, issues)
    }

    /// Describe the spread of `values` when it exceeds the configured limit
    fn spread_issue(
        &self,
        values: &[(&DomainTag, f64)],
        fmt: impl Fn(f64) -> String,
    ) -> Option<String> {
        if values.len() < 2 {
            return None;
        }
        let (max_tag, max) = values
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        let (min_tag, min) = values
            .iter()
            .copied()
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        if max <= 0.0 {
            return None;
        }
        let spread = (max - min) / max;
        (spread > self.config.numeric_spread).then(|| {
            format!(
                "{} reports {}, {} reports {} ({:.0}% apart)",
                max_tag,
                fmt(max),
                min_tag,
                fmt(min),
                spread * 100.0
            )
        })
    }

    fn check_business_rules(&self, sources: &[Source<'_>]) -> CategoryOutcome {
        let mut issues = Vec::new();

        for rule in SEQUENCING_RULES {
            for source in sources {
                let broken_sentence = source
                    .text
                    .split(['.', '!', '?', ';', '\n'])
                    .map(pad)
                    .any(|sentence| {
                        rule.later_terms.iter().any(|t| has_phrase(&sentence, t))
                            && rule.earlier_negations.iter().any(|n| has_phrase(&sentence, n))
                    });

                let inverted_counts = match (
                    source.figures.counts.get(rule.earlier_unit),
                    source.figures.counts.get(rule.later_unit),
                ) {
                    (Some(earlier), Some(later)) => later > earlier,
                    _ => false,
                };

                if broken_sentence || inverted_counts {
                    let detail = if inverted_counts {
                        format!(
                            "more {}s than {}s reported",
                            rule.later_unit, rule.earlier_unit
                        )
                    } else {
                        "later step reported while the earlier one is denied".to_string()
                    };
                    issues.push(Inconsistency::new(
                        ValidationCategory::BusinessRules,
                        format!("{} violates '{}': {}", source.tag, rule.name, detail),
                    ));
                }
            }
        }

        CategoryOutcome::new(self.config.rule_penalty * issues.len() as f64, issues)
    }
}

fn classify(source: &Source<'_>) -> Availability {
    let no_data = NO_DATA_PHRASES.iter().any(|p| source.has(p));
    if no_data && !source.figures.has_figures() {
        Availability::NoData
    } else if source.figures.has_figures() || FOUND_DATA_PHRASES.iter().any(|p| source.has(p)) {
        Availability::Found
    } else {
        Availability::Unknown
    }
}

fn availability_split(sources: &[Source<'_>]) -> bool {
    let classes: Vec<Availability> = sources.iter().map(classify).collect();
    classes.contains(&Availability::NoData) && classes.contains(&Availability::Found)
}

/// Recommendations for the category with the most findings; ties go to the
/// lower-scoring category.
fn recommend(
    inconsistencies: &[Inconsistency],
    scores: &BTreeMap<ValidationCategory, f64>,
) -> Vec<String> {
    let worst = ValidationCategory::all()
        .into_iter()
        .map(|c| {
            let count = inconsistencies.iter().filter(|i| i.category == c).count();
            (c, count, scores.get(&c).copied().unwrap_or(1.0))
        })
        .filter(|(_, count, _)| *count > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.2.total_cmp(&a.2)));

    match worst {
        Some((category, _, _)) => recommendations_for(category)
            .iter()
            .map(|s| s.to_string())
            .collect(),
        None => Vec::new(),
    }
}
