//! Progress reporting for an analysis

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use insight_application::ProgressNotifier;
use insight_domain::{DomainTag, OrchestrationPhase};
use std::sync::{Mutex, PoisonError};

/// Reports progress during an analysis with progress bars on stderr
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Reporter drawing nowhere; used in tests
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn phase_display_name(phase: &OrchestrationPhase) -> &'static str {
        match phase {
            OrchestrationPhase::Dispatch => "Phase 1: Agent Dispatch",
            OrchestrationPhase::Enrichment => "Phase 2: Enrichment",
            OrchestrationPhase::Validation => "Phase 3: Cross-Validation",
        }
    }

    fn phase_short_name(phase: &OrchestrationPhase) -> &'static str {
        match phase {
            OrchestrationPhase::Dispatch => "Phase 1",
            OrchestrationPhase::Enrichment => "Phase 2",
            OrchestrationPhase::Validation => "Phase 3",
        }
    }

    fn current(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.phase_bar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Position of the active phase bar
    pub fn position(&self) -> Option<u64> {
        self.current().as_ref().map(ProgressBar::position)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: &OrchestrationPhase, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(Self::phase_display_name(phase));
        pb.set_message("Starting...");

        *self.current() = Some(pb);
    }

    fn on_agents_selected(&self, selected: &[(DomainTag, f64)]) {
        if let Some(pb) = self.current().as_ref() {
            let names = selected
                .iter()
                .map(|(tag, relevance)| format!("{} {:.2}", tag, relevance))
                .collect::<Vec<_>>()
                .join(", ");
            pb.set_message(names);
        }
    }

    fn on_agent_complete(&self, tag: &DomainTag, success: bool) {
        if let Some(pb) = self.current().as_ref() {
            let status = if success {
                format!("{} {}", "v".green(), tag)
            } else {
                format!("{} {}", "x".red(), tag)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_phase_complete(&self, phase: &OrchestrationPhase) {
        if let Some(pb) = self.current().take() {
            let phase_name = Self::phase_short_name(phase);
            pb.finish_with_message(format!("{} complete!", phase_name.green()));
        }
    }
}

/// Simple text-based progress on stderr (no progress bars)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: &OrchestrationPhase, total_tasks: usize) {
        let phase_name = ProgressReporter::phase_display_name(phase);
        eprintln!("{} {} ({} tasks)", "->".cyan(), phase_name.bold(), total_tasks);
    }

    fn on_agents_selected(&self, selected: &[(DomainTag, f64)]) {
        for (tag, relevance) in selected {
            eprintln!("  {} {} (relevance {:.2})", "*".cyan(), tag, relevance);
        }
    }

    fn on_agent_complete(&self, tag: &DomainTag, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), tag);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), tag);
        }
    }

    fn on_phase_complete(&self, _phase: &OrchestrationPhase) {}
}
