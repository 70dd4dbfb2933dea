//! Console output formatter for analysis results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use insight_domain::{AgentResponse, AnalysisResult};

/// Formats analysis results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete analysis
    pub fn format(result: &AnalysisResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Business Insight Results"));
        output.push('\n');

        output.push_str(&format!("{} {}\n\n", "Question:".cyan().bold(), result.query));
        output.push_str(&Self::verdict_line(result));
        output.push('\n');

        output.push_str(&Self::section_header("Answer"));
        output.push_str(&format!("\n{}\n", result.response.trim_end()));
        if !result.reasoning.is_empty() {
            output.push_str(&format!("\n{} {}\n", "Reasoning:".dimmed(), result.reasoning));
        }

        output.push_str(&Self::section_header("Agent Responses"));
        for response in &result.agent_responses {
            output.push_str(&Self::agent_block(response));
        }

        output.push_str(&Self::section_header("Cross-Validation"));
        let validation = &result.validation;
        output.push_str(&format!(
            "\nScore: {:.2} ({} source(s))\n",
            validation.validation_score(),
            validation.sources()
        ));
        for (category, score) in validation.category_scores() {
            output.push_str(&format!("  {:<20} {:.2}\n", category.to_string(), score));
        }
        if let Some(note) = validation.note() {
            output.push_str(&format!("{}\n", note.dimmed()));
        }
        if !validation.inconsistencies().is_empty() {
            output.push_str(&format!("\n{}\n", "Inconsistencies:".yellow().bold()));
            for issue in validation.inconsistencies() {
                output.push_str(&format!("  * {}\n", issue));
            }
        }
        if !validation.recommendations().is_empty() {
            output.push_str(&format!("\n{}\n", "Recommendations:".cyan().bold()));
            for recommendation in validation.recommendations() {
                output.push_str(&format!("  * {}\n", recommendation));
            }
        }

        let highlights = result.enrichment.highlights();
        if !highlights.is_empty() {
            output.push_str(&Self::section_header("Enrichment"));
            output.push('\n');
            for line in highlights {
                output.push_str(&format!("  * {}\n", line));
            }
        }

        if !result.run_ids.is_empty() {
            output.push_str(&format!(
                "\n{} {}\n",
                "Pipeline runs:".dimmed(),
                result
                    .run_ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
                    .dimmed()
            ));
        }
        output.push_str(&format!(
            "{} {} ms\n",
            "Duration:".dimmed(),
            result.duration_ms
        ));

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(result: &AnalysisResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Answer with its verdict (concise output)
    pub fn format_summary(result: &AnalysisResult) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n\n", "=== Business Insight ===".cyan().bold()));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), result.query));
        output.push_str(&Self::verdict_line(result));
        output.push('\n');
        output.push_str(result.response.trim_end());
        output.push('\n');

        if result.is_degraded() {
            output.push_str(&format!(
                "\n{}\n",
                "Answered from local analysis; text generation was unavailable.".dimmed()
            ));
        }

        output
    }

    fn verdict_line(result: &AnalysisResult) -> String {
        let agents = result
            .agent_responses
            .iter()
            .map(|r| r.agent_tag().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let verdict = if !result.validation.cross_validated() {
            "single source".yellow()
        } else if result.is_approved() {
            "approved".green()
        } else {
            "disputed".red()
        };
        format!(
            "{} {:.0}%  {} {}  {} {}\n",
            "Confidence:".bold(),
            result.confidence * 100.0,
            "Validation:".bold(),
            verdict,
            "Agents:".dimmed(),
            agents
        )
    }

    fn agent_block(response: &AgentResponse) -> String {
        let title = format!(
            "── {} (relevance {:.2}, confidence {:.2}) ──",
            response.agent_tag(),
            response.relevance(),
            response.confidence()
        );
        match (response.text(), response.error()) {
            (Some(text), _) => {
                let title = if response.is_degraded() {
                    format!("{} [local]", title).yellow().bold()
                } else {
                    title.green().bold()
                };
                format!("\n{}\n{}\n", title, Self::indent(text.trim_end(), "  "))
            }
            (None, error) => format!(
                "\n{}\nError: {}\n",
                title.red().bold(),
                error.unwrap_or("Unknown")
            ),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Turn off ANSI colors for all subsequent output
    pub fn disable_color() {
        colored::control::set_override(false);
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_full(&self, result: &AnalysisResult) -> String {
        Self::format(result)
    }

    fn format_summary(&self, result: &AnalysisResult) -> String {
        Self::format_summary(result)
    }

    fn format_json(&self, result: &AnalysisResult) -> String {
        Self::format_json(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_domain::{
        Critic, CriticConfig, DomainTag, EnrichmentReport, OutputFormat, ValidationResult,
    };

    fn result(responses: Vec<AgentResponse>, validation: ValidationResult) -> AnalysisResult {
        AnalysisResult {
            query: "Order revenue for May".to_string(),
            response: responses
                .iter()
                .find_map(|r| r.text())
                .unwrap_or("no answer")
                .to_string(),
            confidence: 0.84,
            reasoning: "orders answered with the highest rank".to_string(),
            validation,
            selected_agent: responses.first().map(|r| r.agent_tag().clone()),
            agent_responses: responses,
            disagreement: None,
            enrichment: EnrichmentReport::default(),
            run_ids: Vec::new(),
            duration_ms: 42,
        }
    }

    fn approved() -> AnalysisResult {
        let responses = vec![
            AgentResponse::answer(
                DomainTag::Orders,
                0.8,
                "Order revenue for May was $10,000.",
                0.9,
                "orders data",
            ),
            AgentResponse::failure(DomainTag::Finance, 0.5, "backend down"),
        ];
        let validation = Critic::new(CriticConfig::default()).validate(&responses);
        result(responses, validation)
    }

    #[test]
    fn test_summary_shows_answer_and_verdict() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format_summary(&approved());
        assert!(output.contains("Q: Order revenue for May"));
        assert!(output.contains("Confidence: 84%"));
        assert!(output.contains("single source"));
        assert!(output.contains("$10,000"));
        assert!(!output.contains("local analysis"));
    }

    #[test]
    fn test_full_lists_agents_and_errors() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format(&approved());
        assert!(output.contains("── orders (relevance 0.80, confidence 0.90) ──"));
        assert!(output.contains("Error: backend down"));
        assert!(output.contains("Cross-Validation"));
        assert!(output.contains("Duration: 42 ms"));
    }

    #[test]
    fn test_json_is_parseable() {
        let json = ConsoleFormatter.render(&approved(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["query"], "Order revenue for May");
        assert_eq!(value["agent_responses"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_degraded_answer_is_flagged() {
        colored::control::set_override(false);
        let responses = vec![
            AgentResponse::answer(DomainTag::Orders, 0.8, "Local orders analysis.", 0.3, "local")
                .degraded(),
        ];
        let validation = ValidationResult::single_source(1);
        let output = ConsoleFormatter::format_summary(&result(responses, validation));
        assert!(output.contains("local analysis"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
