//! Console output formatter for consultation results

use colored::Colorize;
use council_application::ConsultOutput;
use council_domain::{BackendResponse, DeliberationResult, OutputFormat, SynthesisData};

/// Formats consultation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format according to `format`
    pub fn render(output: &ConsultOutput, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => Self::format(output),
            OutputFormat::Synthesis => Self::format_synthesis_only(output),
            OutputFormat::Json => Self::format_json(output),
        }
    }

    /// Format every seat's answer followed by the synthesis
    pub fn format(output: &ConsultOutput) -> String {
        let deliberation = &output.deliberation;
        let mut text = String::new();

        text.push_str(&Self::header("Council Results"));
        text.push('\n');

        text.push_str(&format!(
            "{} {}\n\n",
            "Question:".cyan().bold(),
            deliberation.prompt
        ));
        text.push_str(&format!(
            "{} {}\n",
            "Seats:".cyan().bold(),
            Self::seat_names(deliberation)
        ));

        text.push_str(&Self::section_header("Responses"));
        for response in &deliberation.responses {
            text.push_str(&Self::response_block(response));
        }

        text.push_str(&Self::section_header("Synthesis"));
        text.push_str(&Self::synthesis_body(&output.synthesis, deliberation.success_count));

        text.push_str(&Self::footer());
        text
    }

    /// Format as JSON
    pub fn format_json(output: &ConsultOutput) -> String {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the synthesis only (concise output)
    pub fn format_synthesis_only(output: &ConsultOutput) -> String {
        let deliberation = &output.deliberation;
        let mut text = String::new();

        text.push_str(&format!(
            "{}\n\n",
            "=== Council Synthesis ===".cyan().bold()
        ));
        text.push_str(&format!("{} {}\n\n", "Q:".bold(), deliberation.prompt));
        text.push_str(&format!(
            "{} {}\n",
            "Seats consulted:".dimmed(),
            Self::seat_names(deliberation)
        ));

        let failures: Vec<&BackendResponse> = deliberation.failed_responses().collect();
        if !failures.is_empty() {
            text.push_str(&format!("{}\n", "Failed seats:".red().bold()));
            for failure in failures {
                text.push_str(&format!(
                    "  {} {}: {}\n",
                    "✗".red(),
                    failure.source_name,
                    failure.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }
        text.push('\n');

        text.push_str(&Self::synthesis_body(&output.synthesis, deliberation.success_count));
        text
    }

    /// Format a single streamed answer as JSON (for `--ask -o json`)
    pub fn format_response_json(response: &BackendResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    fn seat_names(deliberation: &DeliberationResult) -> String {
        deliberation
            .responses
            .iter()
            .map(|r| r.source_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn response_block(response: &BackendResponse) -> String {
        let latency = format!("{} ms", response.latency.as_millis());
        match &response.error {
            None => {
                let title = if response.source_id == response.source_name {
                    format!("── {} ──", response.source_name)
                } else {
                    format!("── {} ({}) ──", response.source_name, response.source_id)
                };
                format!(
                    "\n{} {}\n{}\n",
                    title.yellow().bold(),
                    latency.dimmed(),
                    response.text
                )
            }
            Some(error) => format!(
                "\n{} {}\nError: {}\n",
                format!("── {} ──", response.source_name).red().bold(),
                latency.dimmed(),
                error
            ),
        }
    }

    fn synthesis_body(synthesis: &SynthesisData, answered: usize) -> String {
        let mut text = String::new();

        if answered == 0 {
            text.push_str(&format!("{}\n", "No seat answered.".red().bold()));
            return text;
        }

        if !synthesis.agreement_points.is_empty() {
            text.push_str(&format!("\n{}\n", "Agreement:".green().bold()));
            for point in &synthesis.agreement_points {
                text.push_str(&format!("  * {}\n", point));
            }
        } else if answered > 1 {
            text.push_str(&format!(
                "\n{}\n",
                "No point was made by every seat.".dimmed()
            ));
        }

        if !synthesis.disagreements.is_empty() {
            text.push_str(&format!("\n{}\n", "Disagreements:".yellow().bold()));
            for disagreement in &synthesis.disagreements {
                text.push_str(&format!("  * {}\n", disagreement.topic.bold()));
                for position in &disagreement.positions {
                    let stance = if position.stance.is_negative() {
                        "against"
                    } else {
                        "for"
                    };
                    text.push_str(&format!(
                        "      {} [{}]: {}\n",
                        stance,
                        position.sources.join(", "),
                        position.view
                    ));
                }
            }
        }

        if !synthesis.key_insights.is_empty() {
            text.push_str(&format!("\n{}\n", "Key insights:".cyan().bold()));
            for insight in &synthesis.key_insights {
                text.push_str(&format!("  {}: {}\n", insight.source.bold(), insight.insight));
            }
        }

        text.push_str(&format!(
            "\n{} {:.2} ({})\n",
            "Confidence:".bold(),
            synthesis.confidence,
            Self::confidence_label(synthesis.confidence)
        ));
        text
    }

    fn confidence_label(confidence: f64) -> &'static str {
        if confidence >= 0.7 {
            "broad agreement"
        } else if confidence > 0.3 {
            "mixed"
        } else {
            "conflicting"
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::SynthesisEngine;
    use std::time::Duration;

    fn output(responses: Vec<BackendResponse>) -> ConsultOutput {
        let synthesis = SynthesisEngine::extract(&responses);
        ConsultOutput {
            deliberation: DeliberationResult::new(
                "Which database?",
                responses,
                Duration::from_millis(120),
            ),
            synthesis,
        }
    }

    fn split_council() -> ConsultOutput {
        output(vec![
            BackendResponse::success(
                "claude",
                "claude-sonnet-4.5",
                "Use MongoDB for flexibility.",
                Duration::from_millis(80),
            ),
            BackendResponse::success(
                "gpt",
                "gpt-4o",
                "Do not use MongoDB here, use Postgres.",
                Duration::from_millis(95),
            ),
            BackendResponse::failure("gemini", "Connection error: refused", Duration::ZERO),
        ])
    }

    #[test]
    fn test_full_format_shows_answers_and_errors() {
        let text = ConsoleFormatter::format(&split_council());

        assert!(text.contains("Which database?"));
        assert!(text.contains("Use MongoDB for flexibility."));
        assert!(text.contains("claude-sonnet-4.5"));
        assert!(text.contains("Connection error: refused"));
        assert!(text.contains("against"));
        assert!(text.contains("Confidence:"));
    }

    #[test]
    fn test_synthesis_format_lists_failed_seats() {
        let text = ConsoleFormatter::format_synthesis_only(&split_council());

        assert!(text.contains("Failed seats:"));
        assert!(text.contains("gemini: Connection error: refused"));
        assert!(text.contains("mongodb"));
        assert!(!text.contains("── claude"));
    }

    #[test]
    fn test_total_failure_is_reported() {
        let text = ConsoleFormatter::format_synthesis_only(&output(vec![
            BackendResponse::failure("claude", "timeout", Duration::ZERO),
        ]));
        assert!(text.contains("No seat answered."));
    }

    #[test]
    fn test_json_format_embeds_synthesis() {
        let json = ConsoleFormatter::render(&split_council(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["deliberation"]["success_count"], 2);
        assert_eq!(value["deliberation"]["failure_count"], 1);
        assert_eq!(value["deliberation"]["responses"][2]["error"], "Connection error: refused");
        assert_eq!(value["synthesis"]["disagreements"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_json() {
        let response =
            BackendResponse::success("claude", "claude-sonnet-4.5", "Yes.", Duration::from_millis(7));
        let value: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_response_json(&response)).unwrap();
        assert_eq!(value["latency_ms"], 7);
        assert_eq!(value["source_id"], "claude-sonnet-4.5");
    }

    #[test]
    fn test_confidence_labels() {
        assert_eq!(ConsoleFormatter::confidence_label(1.0), "broad agreement");
        assert_eq!(ConsoleFormatter::confidence_label(0.5), "mixed");
        assert_eq!(ConsoleFormatter::confidence_label(0.0), "conflicting");
    }
}
