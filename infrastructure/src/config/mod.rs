//! Configuration file loading for insight-quorum
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `-c key=value` command-line overrides
//! 2. `INSIGHT_` environment variables (`INSIGHT_ORCHESTRATION__MIN_RELEVANCE=0.2`)
//! 3. `--config <path>` specified file
//! 4. Project root: `./insight.toml` or `./.insight.toml`
//! 5. XDG config: `$XDG_CONFIG_HOME/insight-quorum/config.toml`
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigError, FileAgentConfig, FileConfig, FileDataConfig, FileGenerationConfig,
    FileLoggingConfig, FileOrchestrationConfig, FileOutputConfig, FilePipelineConfig,
    PROVIDER_NONE, PROVIDER_OPENAI, apply_overrides,
};
pub use loader::ConfigLoader;
