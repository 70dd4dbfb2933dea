//! Configuration file loader with multi-source merging

use super::file_config::{ConfigError, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde_json::Value;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "insight-quorum";
const PROJECT_FILES: [&str; 2] = ["insight.toml", ".insight.toml"];
const ENV_PREFIX: &str = "INSIGHT_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `-c key=value` overrides
    /// 2. `INSIGHT_` environment variables (`__` separates sections)
    /// 3. Explicit config path (if provided)
    /// 4. Project root: `./insight.toml` or `./.insight.toml`
    /// 5. Global: `$XDG_CONFIG_HOME/insight-quorum/config.toml`
    /// 6. Default values
    pub fn load(
        config_path: Option<&Path>,
        overrides: &[(String, String)],
    ) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(project_path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&project_path));
        }

        Self::extract(figment, config_path, overrides)
    }

    /// Load defaults plus the explicit sources only (for --no-config)
    pub fn load_without_files(overrides: &[(String, String)]) -> Result<FileConfig, ConfigError> {
        Self::extract(
            Figment::new().merge(Serialized::defaults(FileConfig::default())),
            None,
            overrides,
        )
    }

    fn extract(
        mut figment: Figment,
        config_path: Option<&Path>,
        overrides: &[(String, String)],
    ) -> Result<FileConfig, ConfigError> {
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        for (key, raw) in overrides {
            figment = figment.merge((key.as_str(), override_value(raw)));
        }

        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/insight-quorum/config.toml if set,
    /// otherwise falls back to ~/.config/insight-quorum/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");

        if let Some(path) = config_path {
            println!("  [FOUND] Explicit: {}", path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./insight.toml or ./.insight.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Environment: {}*", ENV_PREFIX);
        println!("  [     ] Default: built-in defaults");
    }
}

/// Numbers, booleans and arrays keep their type; anything else is a string
fn override_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
