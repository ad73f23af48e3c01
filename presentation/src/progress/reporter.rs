//! Progress reporting for consultations

use colored::Colorize;
use council_application::ports::progress::{NoProgress, ProgressNotifier};
use council_domain::{DeliberationResult, SeatProgress};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Reports progress during a dispatch with a progress bar
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// One status line per settled seat.
fn seat_line(progress: &SeatProgress) -> String {
    if progress.success {
        format!("{} {}", "✓".green(), progress.source_name)
    } else {
        format!("{} {} (failed)", "✗".red(), progress.source_name)
    }
}

fn summary_line(result: &DeliberationResult) -> String {
    let answered = format!(
        "{}/{} seats answered",
        result.success_count,
        result.responses.len()
    );
    if result.all_failed() {
        answered.red().to_string()
    } else if result.failure_count > 0 {
        answered.yellow().to_string()
    } else {
        answered.green().to_string()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_dispatch_start(&self, total_seats: usize) {
        let pb = ProgressBar::new(total_seats as u64);
        pb.set_style(Self::bar_style());
        pb.set_prefix("Consulting");
        pb.set_message("waiting for seats...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_seat_complete(&self, progress: &SeatProgress) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            pb.println(format!("  {}", seat_line(progress)));
            pb.set_message(progress.source_name.clone());
            pb.inc(1);
        }
    }

    fn on_dispatch_complete(&self, result: &DeliberationResult) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_with_message(summary_line(result));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_dispatch_start(&self, total_seats: usize) {
        eprintln!(
            "{} {} ({} seats)",
            "->".cyan(),
            "Consulting".bold(),
            total_seats
        );
    }

    fn on_seat_complete(&self, progress: &SeatProgress) {
        eprintln!(
            "  [{}/{}] {}",
            progress.completed_count,
            progress.total,
            seat_line(progress)
        );
    }

    fn on_dispatch_complete(&self, result: &DeliberationResult) {
        eprintln!("{}", summary_line(result));
        eprintln!();
    }
}

/// Echoes streamed chunks to stdout as they arrive
pub struct StreamPrinter;

impl ProgressNotifier for StreamPrinter {
    fn on_dispatch_start(&self, _total_seats: usize) {}
    fn on_seat_complete(&self, _progress: &SeatProgress) {}
    fn on_dispatch_complete(&self, _result: &DeliberationResult) {}

    fn on_stream_chunk(&self, _seat: &str, chunk: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(chunk.as_bytes());
        let _ = stdout.flush();
    }

    fn on_stream_end(&self, _seat: &str) {
        println!();
    }
}

/// How consultation progress is shown on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// No progress output (`--quiet`)
    Quiet,
    /// Animated bar for an interactive terminal
    Bar,
    /// One plain line per event, for redirected stderr
    Lines,
}

impl ProgressMode {
    pub fn detect(quiet: bool, interactive: bool) -> Self {
        match (quiet, interactive) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Bar,
            (false, false) => Self::Lines,
        }
    }

    pub fn notifier(self) -> Box<dyn ProgressNotifier> {
        match self {
            Self::Quiet => Box::new(NoProgress),
            Self::Bar => Box::new(ProgressReporter::new()),
            Self::Lines => Box::new(SimpleProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::BackendResponse;
    use std::time::Duration;

    #[test]
    fn test_seat_line_marks_failures() {
        let ok = SeatProgress {
            source_name: "claude".to_string(),
            success: true,
            completed_count: 1,
            total: 2,
        };
        let failed = SeatProgress {
            source_name: "gpt".to_string(),
            success: false,
            ..ok.clone()
        };

        assert!(seat_line(&ok).contains("claude"));
        assert!(!seat_line(&ok).contains("failed"));
        assert!(seat_line(&failed).contains("(failed)"));
    }

    #[test]
    fn test_summary_counts() {
        let result = DeliberationResult::new(
            "q",
            vec![
                BackendResponse::success("claude", "claude-sonnet", "Yes.", Duration::ZERO),
                BackendResponse::failure("gpt", "timeout", Duration::ZERO),
            ],
            Duration::from_millis(40),
        );
        assert!(summary_line(&result).contains("1/2 seats answered"));
    }

    #[test]
    fn test_reporter_tolerates_events_without_start() {
        let reporter = ProgressReporter::new();
        reporter.on_seat_complete(&SeatProgress {
            source_name: "claude".to_string(),
            success: true,
            completed_count: 1,
            total: 1,
        });
        reporter.on_dispatch_complete(&DeliberationResult::new("q", vec![], Duration::ZERO));
    }

    #[test]
    fn test_progress_mode_detection() {
        assert_eq!(ProgressMode::detect(true, true), ProgressMode::Quiet);
        assert_eq!(ProgressMode::detect(true, false), ProgressMode::Quiet);
        assert_eq!(ProgressMode::detect(false, true), ProgressMode::Bar);
        assert_eq!(ProgressMode::detect(false, false), ProgressMode::Lines);
    }

    #[test]
    fn test_line_mode_notifier_handles_a_dispatch() {
        let progress = ProgressMode::Lines.notifier();
        progress.on_dispatch_start(1);
        progress.on_seat_complete(&SeatProgress {
            source_name: "gpt".to_string(),
            success: false,
            completed_count: 1,
            total: 1,
        });
        progress.on_dispatch_complete(&DeliberationResult::new("q", vec![], Duration::ZERO));
    }
}
