//! Specialist overrides from TOML (`[agents.<tag>]` sections)
//!
//! ```toml
//! [agents.orders]
//! normalization = 4.0
//! keywords = { preorder = 2.5, order = 3.5 }
//!
//! [agents.inventory]
//! enabled = false
//! ```

use insight_domain::{ConfigIssue, ConfigIssueCode, DomainKnowledge, DomainTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub enabled: bool,
    pub normalization: Option<f64>,
    /// Keyword weights added to (or replacing entries of) the built-in table
    pub keywords: BTreeMap<String, f64>,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            normalization: None,
            keywords: BTreeMap::new(),
        }
    }
}

impl FileAgentConfig {
    pub fn apply(&self, knowledge: &mut DomainKnowledge) {
        for (keyword, weight) in &self.keywords {
            knowledge.keywords.set_weight(keyword, *weight);
        }
        if let Some(normalization) = self.normalization {
            knowledge.keywords.set_normalization(normalization);
        }
    }
}

/// Apply `[agents.*]` overrides to a catalog, dropping disabled specialists
pub fn apply_overrides(
    catalog: Vec<DomainKnowledge>,
    overrides: &BTreeMap<String, FileAgentConfig>,
) -> Vec<DomainKnowledge> {
    catalog
        .into_iter()
        .filter_map(|mut knowledge| {
            match overrides.get(knowledge.tag.as_str()) {
                Some(config) if !config.enabled => return None,
                Some(config) => config.apply(&mut knowledge),
                None => {}
            }
            Some(knowledge)
        })
        .collect()
}

pub(super) fn validate(overrides: &BTreeMap<String, FileAgentConfig>) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let builtin = DomainTag::builtin();

    for (name, config) in overrides {
        let known = name
            .parse::<DomainTag>()
            .map(|tag| builtin.contains(&tag))
            .unwrap_or(false);
        if !known {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::UnknownDomainTag,
                format!("[agents.{}]: no specialist with this name, section ignored", name),
            ));
        }

        if let Some(normalization) = config.normalization
            && normalization <= 0.0
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::NonPositiveNormalization,
                format!(
                    "agents.{}.normalization: {} must be positive, keeping the built-in value",
                    name, normalization
                ),
            ));
        }

        for (keyword, weight) in &config.keywords {
            if *weight < 0.0 {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange,
                    format!(
                        "agents.{}.keywords.{}: negative weight {} is treated as 0",
                        name, keyword, weight
                    ),
                ));
            }
        }
    }

    issues
}
