//! Infrastructure layer for insight-quorum
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod data;
pub mod generation;
pub mod logging;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use data::{FixtureDataProvider, FixtureError, StaticDataProvider};
#[cfg(feature = "http-generation")]
pub use generation::HttpTextGenerator;
pub use generation::{OfflineGenerator, build_generator};
pub use logging::JsonlEventLogger;
