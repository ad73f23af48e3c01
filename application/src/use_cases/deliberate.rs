//! Deliberate use case
//!
//! Fans one prompt out to every seat concurrently and assembles the per-seat
//! outcomes into a [`DeliberationResult`]. A failing seat never aborts its
//! siblings; it becomes a response with `error` set.

use crate::ports::backend::{ModelBackend, QueryOptions};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::shared::{failure_text, query_cancellable};
use council_domain::{BackendResponse, DeliberationResult, SeatProgress};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Errors raised when building a dispatcher
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No seats configured")]
    NoSeats,
}

/// One named position in the roster, backed by a capability
/// (usually a fallback group).
#[derive(Clone)]
pub struct Seat {
    name: String,
    backend: Arc<dyn ModelBackend>,
}

impl Seat {
    pub fn new(name: impl Into<String>, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &Arc<dyn ModelBackend> {
        &self.backend
    }
}

impl fmt::Debug for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seat")
            .field("name", &self.name)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Concurrent fan-out over a fixed, ordered roster of seats.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    seats: Vec<Seat>,
}

impl Dispatcher {
    pub fn new(seats: Vec<Seat>) -> Result<Self, DispatchError> {
        if seats.is_empty() {
            return Err(DispatchError::NoSeats);
        }
        Ok(Self { seats })
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Look up a seat by name.
    pub fn seat(&self, name: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.name == name)
    }

    pub async fn deliberate(&self, prompt: &str, options: &QueryOptions) -> DeliberationResult {
        self.deliberate_with_progress(prompt, options, &NoProgress)
            .await
    }

    /// Query every seat concurrently and wait until all of them settle.
    ///
    /// Responses come back in configuration order; `progress` is told about
    /// each seat in completion order. Once the cancellation token fires,
    /// in-flight queries are dropped and seats that had not started yet are
    /// recorded as `"cancelled"` without being queried.
    pub async fn deliberate_with_progress(
        &self,
        prompt: &str,
        options: &QueryOptions,
        progress: &dyn ProgressNotifier,
    ) -> DeliberationResult {
        let total = self.seats.len();
        let started = Instant::now();

        info!(seats = total, "Dispatching prompt");
        progress.on_dispatch_start(total);

        let shared_prompt: Arc<str> = Arc::from(prompt);
        let mut join_set = JoinSet::new();
        let mut task_slots = HashMap::with_capacity(total);

        for (index, seat) in self.seats.iter().enumerate() {
            let seat = seat.clone();
            let prompt = Arc::clone(&shared_prompt);
            let options = options.clone();

            let handle = join_set.spawn(async move {
                let response = run_seat(&seat, &prompt, &options).await;
                (index, response)
            });
            task_slots.insert(handle.id(), index);
        }

        let mut slots: Vec<Option<BackendResponse>> = (0..total).map(|_| None).collect();
        let mut completed = 0;

        while let Some(joined) = join_set.join_next().await {
            let (index, response) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    let Some(&index) = task_slots.get(&e.id()) else {
                        warn!("Task join error for unknown seat: {}", e);
                        continue;
                    };
                    let name = self.seats[index].name();
                    warn!(seat = name, "Seat task failed: {}", e);
                    let response =
                        BackendResponse::failure(name, format!("task failed: {e}"), started.elapsed());
                    (index, response)
                }
            };

            completed += 1;
            progress.on_seat_complete(&SeatProgress {
                source_name: response.source_name.clone(),
                success: response.is_success(),
                completed_count: completed,
                total,
            });
            slots[index] = Some(response);
        }

        let responses: Vec<BackendResponse> = slots
            .into_iter()
            .zip(&self.seats)
            .map(|(slot, seat)| {
                slot.unwrap_or_else(|| {
                    BackendResponse::failure(seat.name(), "no result", started.elapsed())
                })
            })
            .collect();

        let result = DeliberationResult::new(prompt, responses, started.elapsed());
        info!(
            succeeded = result.success_count,
            failed = result.failure_count,
            elapsed_ms = result.total_latency.as_millis() as u64,
            "Dispatch complete"
        );
        progress.on_dispatch_complete(&result);
        result
    }
}

async fn run_seat(seat: &Seat, prompt: &str, options: &QueryOptions) -> BackendResponse {
    let started = Instant::now();
    debug!(seat = seat.name(), "Querying seat");

    match query_cancellable(seat.backend.as_ref(), prompt, options).await {
        Ok(reply) => {
            let latency = started.elapsed();
            info!(
                seat = seat.name(),
                source_id = %reply.source_id,
                latency_ms = latency.as_millis() as u64,
                "Seat responded"
            );
            BackendResponse::success(seat.name(), reply.source_id, reply.text, latency)
                .with_tokens_used(reply.tokens_used)
        }
        Err(e) => {
            if e.is_cancelled() {
                debug!(seat = seat.name(), "Seat cancelled");
            } else {
                warn!(seat = seat.name(), "Seat failed: {}", e);
            }
            BackendResponse::failure(seat.name(), failure_text(&e), started.elapsed())
        }
    }
}
