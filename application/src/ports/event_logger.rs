//! Port for structured orchestration event logging.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port records what each
//! analysis did (agents dispatched, validation verdict, final answer) in a
//! machine-readable format (JSONL).

use serde_json::Value;

/// A structured orchestration event.
pub struct OrchestrationEvent {
    /// Event type identifier (e.g., "dispatch", "validation", "analysis").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl OrchestrationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging orchestration events.
///
/// `log` is synchronous and infallible: a logging failure never disrupts an
/// analysis.
pub trait EventLogger: Send + Sync {
    fn log(&self, event: OrchestrationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoEventLogger;

impl EventLogger for NoEventLogger {
    fn log(&self, _event: OrchestrationEvent) {}
}
