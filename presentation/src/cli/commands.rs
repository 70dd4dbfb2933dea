//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Answer, validation details and every agent response
    Full,
    /// Answer with confidence and validation verdict
    Summary,
    /// JSON output
    Json,
}

impl From<OutputFormat> for insight_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => insight_domain::OutputFormat::Full,
            OutputFormat::Summary => insight_domain::OutputFormat::Summary,
            OutputFormat::Json => insight_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for insight-quorum
#[derive(Parser, Debug)]
#[command(name = "insight-quorum")]
#[command(author, version, about = "Business questions answered by a quorum of domain specialists")]
#[command(long_about = r#"
insight-quorum routes a business question to the specialists it concerns
(orders, shipments, finance, deliveries, customers, inventory), lets each
answer from its own data, cross-checks the answers and returns the best one
with a confidence score.

The process has three phases:
1. Dispatch: relevant specialists answer in parallel, each through a pipeline
2. Enrichment: trends, comparisons and ratios are derived from the data
3. Cross-Validation: the answers are checked against each other

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./insight.toml      Project-level config
3. ~/.config/insight-quorum/config.toml   Global config

Example:
  insight-quorum "Order revenue for May"
  insight-quorum --data data/business.json -o full "How many orders were delivered last week?"
  insight-quorum -c orchestration.min_relevance=0.2 --pipeline semantic "late deliveries"
"#)]
pub struct Cli {
    /// The business question to analyze
    pub query: Option<String>,

    /// Override a configuration value (repeatable)
    #[arg(short = 'c', long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub overrides: Vec<(String, String)>,

    /// Output format [default: from config, else summary]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Pipeline each specialist runs (standard, semantic, advanced, or custom)
    #[arg(long, value_name = "NAME")]
    pub pipeline: Option<String>,

    /// JSON data fixture served to the specialists
    #[arg(long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// User identifier attached to the query
    #[arg(long, value_name = "ID")]
    pub user: Option<String>,

    /// Session identifier attached to the query
    #[arg(long, value_name = "ID")]
    pub session: Option<String>,
}

impl Cli {
    /// Overrides from dedicated flags, applied after `-c` pairs
    pub fn config_overrides(&self) -> Vec<(String, String)> {
        let mut overrides = self.overrides.clone();
        if let Some(pipeline) = &self.pipeline {
            overrides.push((
                "orchestration.default_pipeline".to_string(),
                pipeline.clone(),
            ));
        }
        if let Some(data) = &self.data {
            overrides.push(("data.fixture".to_string(), data.display().to_string()));
        }
        overrides
    }
}

/// Parse a `key=value` argument
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}
