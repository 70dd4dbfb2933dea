//! Port definitions (interfaces for external adapters)

pub mod data_provider;
pub mod event_logger;
pub mod progress;
pub mod text_generator;
