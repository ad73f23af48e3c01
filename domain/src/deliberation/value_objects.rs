//! Deliberation value objects - immutable result types for one consultation.
//!
//! - [`BackendResponse`] - a single seat's settled answer or error
//! - [`DeliberationResult`] - all responses for one dispatched prompt
//! - [`SeatProgress`] - emitted once per seat completion, in completion order

use crate::util::duration_millis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response from a single seat.
///
/// A failed seat still produces a response: `error` is set and `text` is
/// empty. The dispatcher never throws seat failures past this point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    /// The answer text (empty on failure)
    pub text: String,
    /// Seat name as configured (e.g. "claude")
    pub source_name: String,
    /// Concrete backend that produced the answer (e.g. "claude-sonnet-4.5")
    pub source_id: String,
    /// Wall-clock time the seat took to settle
    #[serde(rename = "latency_ms", with = "duration_millis")]
    pub latency: Duration,
    /// Error message if the seat failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Token usage reported by the backend, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl BackendResponse {
    /// Creates a successful response.
    pub fn success(
        source_name: impl Into<String>,
        source_id: impl Into<String>,
        text: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self {
            text: text.into(),
            source_name: source_name.into(),
            source_id: source_id.into(),
            latency,
            error: None,
            tokens_used: None,
        }
    }

    /// Creates a failed response. The source id defaults to the seat name
    /// since no concrete backend produced an answer.
    pub fn failure(
        source_name: impl Into<String>,
        error: impl Into<String>,
        latency: Duration,
    ) -> Self {
        let source_name = source_name.into();
        Self {
            text: String::new(),
            source_id: source_name.clone(),
            source_name,
            latency,
            error: Some(error.into()),
            tokens_used: None,
        }
    }

    /// Attach the token count reported by the backend.
    pub fn with_tokens_used(mut self, tokens_used: Option<u64>) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    /// Returns `true` if the seat answered without error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns `true` if the response is usable for synthesis:
    /// no error and non-blank text.
    pub fn has_content(&self) -> bool {
        self.is_success() && !self.text.trim().is_empty()
    }
}

/// Complete result of dispatching one prompt to every seat.
///
/// `responses` is in configuration order regardless of completion order, and
/// `success_count + failure_count == responses.len()` always holds because
/// the counts are derived in [`DeliberationResult::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationResult {
    /// The prompt every seat received
    pub prompt: String,
    /// One response per configured seat, in configuration order
    pub responses: Vec<BackendResponse>,
    pub success_count: usize,
    pub failure_count: usize,
    /// Wall-clock time of the whole dispatch
    #[serde(rename = "total_latency_ms", with = "duration_millis")]
    pub total_latency: Duration,
}

impl DeliberationResult {
    pub fn new(
        prompt: impl Into<String>,
        responses: Vec<BackendResponse>,
        total_latency: Duration,
    ) -> Self {
        let success_count = responses.iter().filter(|r| r.is_success()).count();
        let failure_count = responses.len() - success_count;
        Self {
            prompt: prompt.into(),
            responses,
            success_count,
            failure_count,
            total_latency,
        }
    }

    /// Returns an iterator over only the successful responses.
    pub fn successful_responses(&self) -> impl Iterator<Item = &BackendResponse> {
        self.responses.iter().filter(|r| r.is_success())
    }

    /// Returns an iterator over only the failed responses.
    pub fn failed_responses(&self) -> impl Iterator<Item = &BackendResponse> {
        self.responses.iter().filter(|r| !r.is_success())
    }

    /// Every seat failed. The result is still complete; deciding that it is
    /// unusable is up to the caller.
    pub fn all_failed(&self) -> bool {
        self.success_count == 0
    }
}

/// Progress payload emitted after each seat settles.
///
/// `completed_count` grows by exactly one per emission and reflects real
/// completion order, not configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatProgress {
    pub source_name: String,
    pub success: bool,
    pub completed_count: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_failure_constructors() {
        let ok = BackendResponse::success("claude", "claude-sonnet-4.5", "Answer", Duration::ZERO)
            .with_tokens_used(Some(42));
        assert!(ok.is_success());
        assert!(ok.has_content());
        assert_eq!(ok.tokens_used, Some(42));

        let failed = BackendResponse::failure("gpt", "network down", Duration::from_millis(5));
        assert!(!failed.is_success());
        assert!(!failed.has_content());
        assert!(failed.text.is_empty());
        assert_eq!(failed.source_id, "gpt");
    }

    #[test]
    fn test_blank_success_has_no_content() {
        let blank = BackendResponse::success("a", "a-1", "  \n", Duration::ZERO);
        assert!(blank.is_success());
        assert!(!blank.has_content());
    }

    #[test]
    fn test_counts_are_derived() {
        let result = DeliberationResult::new(
            "prompt",
            vec![
                BackendResponse::success("a", "a-1", "yes", Duration::ZERO),
                BackendResponse::failure("b", "boom", Duration::ZERO),
                BackendResponse::success("c", "c-1", "no", Duration::ZERO),
            ],
            Duration::from_millis(10),
        );

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
        assert_eq!(
            result.success_count + result.failure_count,
            result.responses.len()
        );
        assert_eq!(result.successful_responses().count(), 2);
        assert_eq!(result.failed_responses().next().unwrap().source_name, "b");
        assert!(!result.all_failed());
    }

    #[test]
    fn test_all_failed() {
        let result = DeliberationResult::new(
            "prompt",
            vec![BackendResponse::failure("a", "x", Duration::ZERO)],
            Duration::ZERO,
        );
        assert!(result.all_failed());
    }

    #[test]
    fn test_json_shape() {
        let response =
            BackendResponse::success("claude", "claude-sonnet-4.5", "hi", Duration::from_millis(250));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["latency_ms"], 250);
        assert_eq!(json["source_name"], "claude");
        assert!(json.get("error").is_none());
    }
}
