//! Data and log locations from TOML (`[data]` and `[logging]` sections)
//!
//! ```toml
//! [data]
//! fixture = "data/business.json"
//!
//! [logging]
//! event_log = "logs/events.jsonl"
//! log_dir = "logs"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDataConfig {
    /// JSON document `{ "<domain>": payload }` served to the specialists
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving one record per orchestration event
    pub event_log: Option<PathBuf>,
    /// Directory for daily-rolling diagnostic logs
    pub log_dir: Option<PathBuf>,
}
