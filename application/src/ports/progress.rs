//! Progress notification port
//!
//! Defines the interface for reporting progress during an analysis.

use insight_domain::{DomainTag, OrchestrationPhase};

/// Callback for progress updates during an analysis
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: &OrchestrationPhase, total_tasks: usize);

    /// Called when one agent has answered (or failed) during dispatch
    fn on_agent_complete(&self, tag: &DomainTag, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &OrchestrationPhase);

    /// Called once the relevant agents are known, with their relevance
    fn on_agents_selected(&self, _selected: &[(DomainTag, f64)]) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: &OrchestrationPhase, _total_tasks: usize) {}
    fn on_agent_complete(&self, _tag: &DomainTag, _success: bool) {}
    fn on_phase_complete(&self, _phase: &OrchestrationPhase) {}
}
