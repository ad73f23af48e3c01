//! Progress notification port
//!
//! Defines the interface for reporting progress while a prompt is
//! dispatched to the seats.

use council_domain::{DeliberationResult, SeatProgress};

/// Callback for progress updates during a dispatch
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, plain log lines, nothing).
pub trait ProgressNotifier: Send + Sync {
    /// Called once before any seat is queried
    fn on_dispatch_start(&self, total_seats: usize);

    /// Called as each seat finishes, in completion order
    fn on_seat_complete(&self, progress: &SeatProgress);

    /// Called once every seat has an outcome
    fn on_dispatch_complete(&self, result: &DeliberationResult);

    // ==================== Stream Callbacks ====================

    /// Called when a single seat starts streaming.
    fn on_stream_start(&self, _seat: &str) {}

    /// Called for each text chunk while streaming.
    fn on_stream_chunk(&self, _seat: &str, _chunk: &str) {}

    /// Called when a stream finishes.
    fn on_stream_end(&self, _seat: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_dispatch_start(&self, _total_seats: usize) {}
    fn on_seat_complete(&self, _progress: &SeatProgress) {}
    fn on_dispatch_complete(&self, _result: &DeliberationResult) {}
}
