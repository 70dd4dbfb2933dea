//! Output formatter trait

use insight_domain::{AnalysisResult, OutputFormat};

/// Trait for formatting analysis results
pub trait OutputFormatter {
    /// Answer, validation details and every agent response
    fn format_full(&self, result: &AnalysisResult) -> String;

    /// Answer with confidence and validation verdict
    fn format_summary(&self, result: &AnalysisResult) -> String;

    fn format_json(&self, result: &AnalysisResult) -> String;

    fn render(&self, result: &AnalysisResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format_full(result),
            OutputFormat::Summary => self.format_summary(result),
            OutputFormat::Json => self.format_json(result),
        }
    }
}
