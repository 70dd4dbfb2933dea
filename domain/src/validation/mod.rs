//! Cross-validation of candidate answers

pub mod critic;
pub mod extract;
pub mod result;
pub mod rules;

pub use critic::{Critic, CriticConfig};
pub use extract::ExtractedFigures;
pub use result::{APPROVAL_THRESHOLD, Inconsistency, ValidationCategory, ValidationResult};
