//! Port for structured consultation logging.
//!
//! Records each consultation (prompt, per-seat outcomes, synthesis) as
//! machine-readable events. This is separate from `tracing`, which carries
//! the human-readable diagnostics.

use serde_json::Value;

/// A structured consultation event.
pub struct ConsultationEvent {
    /// Event type identifier (e.g. "prompt", "seat_response", "synthesis").
    pub event_type: &'static str,
    pub payload: Value,
}

impl ConsultationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging consultation events.
///
/// `log` is synchronous and infallible; sinks swallow their own write errors.
pub trait ConsultationLogger: Send + Sync {
    fn log(&self, event: ConsultationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConsultationLogger;

impl ConsultationLogger for NoConsultationLogger {
    fn log(&self, _event: ConsultationEvent) {}
}
