//! Fallback group: one seat backed by an ordered list of candidates.
//!
//! Calls start at the candidate that last succeeded and rotate through the
//! rest. A candidate that failed within the cooldown window is skipped,
//! unless every candidate is cooling down, in which case the whole rotation
//! is tried anyway.

use async_trait::async_trait;
use council_application::ports::backend::{
    BackendError, BackendReply, ModelBackend, QueryOptions, StreamHandle,
};
use council_domain::StreamEvent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default time a failed candidate is skipped for.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("fallback group '{0}' has no candidates")]
pub struct EmptyGroupError(pub String);

/// Health bookkeeping, owned by exactly one group.
#[derive(Debug)]
struct Health {
    /// Index of the candidate that last succeeded
    sticky: usize,
    last_failure: Vec<Option<Instant>>,
}

impl Health {
    fn is_cooling(&self, index: usize, now: Instant, cooldown: Duration) -> bool {
        self.last_failure[index].is_some_and(|at| now.saturating_duration_since(at) < cooldown)
    }
}

pub struct FallbackGroup {
    name: String,
    candidates: Vec<Arc<dyn ModelBackend>>,
    cooldown: Duration,
    health: Mutex<Health>,
}

impl FallbackGroup {
    pub fn new(
        name: impl Into<String>,
        candidates: Vec<Arc<dyn ModelBackend>>,
        cooldown: Duration,
    ) -> Result<Self, EmptyGroupError> {
        let name = name.into();
        if candidates.is_empty() {
            return Err(EmptyGroupError(name));
        }
        let health = Health {
            sticky: 0,
            last_failure: vec![None; candidates.len()],
        };
        Ok(Self {
            name,
            candidates,
            cooldown,
            health: Mutex::new(health),
        })
    }

    pub fn candidates(&self) -> &[Arc<dyn ModelBackend>] {
        &self.candidates
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn health(&self) -> MutexGuard<'_, Health> {
        self.health.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Candidate indices to try, in order, for one call.
    fn attempt_order(&self) -> Vec<usize> {
        let health = self.health();
        let now = Instant::now();
        let count = self.candidates.len();

        let rotated: Vec<usize> = (0..count)
            .map(|offset| (health.sticky + offset) % count)
            .collect();
        let eligible: Vec<usize> = rotated
            .iter()
            .copied()
            .filter(|&i| !health.is_cooling(i, now, self.cooldown))
            .collect();

        if eligible.is_empty() {
            debug!(group = %self.name, "All candidates cooling down, trying full rotation");
            return rotated;
        }
        if eligible.len() < rotated.len() {
            debug!(
                group = %self.name,
                skipped = rotated.len() - eligible.len(),
                "Skipping candidates in cooldown"
            );
        }
        eligible
    }

    fn record_failure(&self, index: usize, error: &BackendError) {
        warn!(
            group = %self.name,
            candidate = self.candidates[index].name(),
            "Candidate failed: {}",
            error
        );
        self.health().last_failure[index] = Some(Instant::now());
    }

    fn record_success(&self, index: usize) {
        let mut health = self.health();
        if health.sticky != index {
            info!(
                group = %self.name,
                candidate = self.candidates[index].name(),
                "Switching primary candidate"
            );
        }
        health.sticky = index;
        health.last_failure[index] = None;
    }

    fn exhausted(&self, last_error: Option<BackendError>) -> BackendError {
        last_error.unwrap_or_else(|| BackendError::Other(format!("{}: no candidates", self.name)))
    }
}

#[async_trait]
impl ModelBackend for FallbackGroup {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<BackendReply, BackendError> {
        let mut last_error = None;

        for index in self.attempt_order() {
            options.check_cancelled()?;
            let candidate = &self.candidates[index];
            debug!(group = %self.name, candidate = candidate.name(), "Trying candidate");

            match candidate.query(prompt, options).await {
                Ok(reply) => {
                    self.record_success(index);
                    return Ok(reply);
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    self.record_failure(index, &e);
                    last_error = Some(e);
                }
            }
        }

        Err(self.exhausted(last_error))
    }

    /// A candidate is committed to once its first event arrives without
    /// error; failures after that reach the caller through the stream.
    async fn query_stream(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<StreamHandle, BackendError> {
        let mut last_error = None;

        for index in self.attempt_order() {
            options.check_cancelled()?;
            let candidate = &self.candidates[index];

            let mut handle = match candidate.query_stream(prompt, options).await {
                Ok(handle) => handle,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    self.record_failure(index, &e);
                    last_error = Some(e);
                    continue;
                }
            };

            let error = match handle.next().await {
                Some(StreamEvent::Error(message)) => BackendError::RequestFailed(message),
                None => BackendError::InvalidResponse("stream ended without output".to_string()),
                Some(first) => {
                    self.record_success(index);
                    let source_id = handle
                        .source_id()
                        .unwrap_or(candidate.name())
                        .to_string();
                    return Ok(handle.prepend(first).with_source_id(source_id));
                }
            };
            self.record_failure(index, &error);
            last_error = Some(error);
        }

        Err(self.exhausted(last_error))
    }
}
