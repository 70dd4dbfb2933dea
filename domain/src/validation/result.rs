//! Validation result value object

use crate::core::score::{clamp_unit, round2};
use serde::Serialize;
use std::collections::BTreeMap;

/// Minimum validation score for an approved answer set
pub const APPROVAL_THRESHOLD: f64 = 0.7;

/// The four independent consistency checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
    Temporal,
    DataAvailability,
    Numeric,
    BusinessRules,
}

impl ValidationCategory {
    pub fn all() -> [ValidationCategory; 4] {
        [
            ValidationCategory::Temporal,
            ValidationCategory::DataAvailability,
            ValidationCategory::Numeric,
            ValidationCategory::BusinessRules,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCategory::Temporal => "temporal",
            ValidationCategory::DataAvailability => "data_availability",
            ValidationCategory::Numeric => "numeric",
            ValidationCategory::BusinessRules => "business_rules",
        }
    }
}

impl std::fmt::Display for ValidationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detected inconsistency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inconsistency {
    pub category: ValidationCategory,
    pub message: String,
}

impl Inconsistency {
    pub fn new(category: ValidationCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Outcome of cross-validating one answer set.
///
/// Fields are private so that `approved` always agrees with the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    validation_score: f64,
    inconsistencies: Vec<Inconsistency>,
    recommendations: Vec<String>,
    approved: bool,
    category_scores: BTreeMap<ValidationCategory, f64>,
    cross_validated: bool,
    sources: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl ValidationResult {
    pub fn new(
        validation_score: f64,
        category_scores: BTreeMap<ValidationCategory, f64>,
        inconsistencies: Vec<Inconsistency>,
        recommendations: Vec<String>,
        sources: usize,
    ) -> Self {
        let validation_score = round2(clamp_unit(validation_score));
        Self {
            validation_score,
            inconsistencies,
            recommendations,
            approved: validation_score >= APPROVAL_THRESHOLD,
            category_scores: category_scores
                .into_iter()
                .map(|(c, s)| (c, round2(clamp_unit(s))))
                .collect(),
            cross_validated: true,
            sources,
            note: None,
        }
    }

    /// Neutral result when fewer than two answers can be compared
    pub fn single_source(sources: usize) -> Self {
        let category_scores = ValidationCategory::all()
            .into_iter()
            .map(|c| (c, 1.0))
            .collect();
        let mut result = Self::new(1.0, category_scores, Vec::new(), Vec::new(), sources);
        result.cross_validated = false;
        result.note = Some(if sources == 0 {
            "No answer carried text; cross-validation was not possible".to_string()
        } else {
            "Single-source answer; cross-validation was not possible".to_string()
        });
        result
    }

    pub fn validation_score(&self) -> f64 {
        self.validation_score
    }

    pub fn approved(&self) -> bool {
        self.approved
    }

    pub fn inconsistencies(&self) -> &[Inconsistency] {
        &self.inconsistencies
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn category_scores(&self) -> &BTreeMap<ValidationCategory, f64> {
        &self.category_scores
    }

    pub fn category_score(&self, category: ValidationCategory) -> f64 {
        self.category_scores.get(&category).copied().unwrap_or(1.0)
    }

    pub fn cross_validated(&self) -> bool {
        self.cross_validated
    }

    /// Number of answers that carried usable text
    pub fn sources(&self) -> usize {
        self.sources
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }

    pub fn count_in(&self, category: ValidationCategory) -> usize {
        self.inconsistencies
            .iter()
            .filter(|i| i.category == category)
            .count()
    }
}
