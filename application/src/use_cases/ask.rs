//! Ask use case
//!
//! Streams a single seat's answer instead of consulting the whole roster.

use crate::ports::backend::{BackendError, QueryOptions, StreamHandle};
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::deliberate::{Dispatcher, Seat};
use council_domain::{BackendResponse, Question, StreamEvent};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

/// Errors that can occur while asking a single seat
#[derive(Error, Debug)]
pub enum AskError {
    #[error("Unknown seat '{0}'")]
    UnknownSeat(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Seat '{seat}' failed: {source}")]
    Backend {
        seat: String,
        #[source]
        source: BackendError,
    },
}

/// Use case for streaming one seat's answer
pub struct AskUseCase {
    seat: Seat,
}

impl AskUseCase {
    pub fn new(seat: Seat) -> Self {
        Self { seat }
    }

    /// Pick the seat named `name` from a dispatcher's roster.
    pub fn for_seat(dispatcher: &Dispatcher, name: &str) -> Result<Self, AskError> {
        dispatcher
            .seat(name)
            .cloned()
            .map(Self::new)
            .ok_or_else(|| AskError::UnknownSeat(name.to_string()))
    }

    pub fn seat_name(&self) -> &str {
        self.seat.name()
    }

    /// Stream the answer, forwarding each chunk to `progress`.
    pub async fn execute(
        &self,
        question: &Question,
        options: &QueryOptions,
        progress: &dyn ProgressNotifier,
    ) -> Result<BackendResponse, AskError> {
        let name = self.seat.name();
        let started = Instant::now();
        options.check_cancelled().map_err(|e| self.backend_error(e))?;

        debug!(seat = name, "Streaming seat");
        let mut handle = self.open_stream(question.content(), options).await?;
        let source_id = handle
            .source_id()
            .unwrap_or(self.seat.backend().name())
            .to_string();

        progress.on_stream_start(name);
        let mut text = String::new();

        loop {
            let event = match &options.cancellation {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(AskError::Cancelled),
                    event = handle.next() => event,
                },
                None => handle.next().await,
            };

            match event {
                Some(StreamEvent::Delta(chunk)) => {
                    progress.on_stream_chunk(name, &chunk);
                    text.push_str(&chunk);
                }
                Some(StreamEvent::Completed(full)) => {
                    if text.is_empty() {
                        progress.on_stream_chunk(name, &full);
                    }
                    // The completed text is the answer; deltas were for display.
                    text = full;
                    break;
                }
                Some(StreamEvent::Error(message)) => {
                    progress.on_stream_end(name);
                    return Err(self.backend_error(BackendError::RequestFailed(message)));
                }
                None => break,
            }
        }

        progress.on_stream_end(name);
        let latency = started.elapsed();
        info!(
            seat = name,
            source_id = %source_id,
            latency_ms = latency.as_millis() as u64,
            "Seat streamed answer"
        );
        Ok(BackendResponse::success(name, source_id, text, latency))
    }

    async fn open_stream(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<StreamHandle, AskError> {
        let backend = self.seat.backend();
        let opened = match &options.cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(BackendError::Cancelled),
                handle = backend.query_stream(prompt, options) => handle,
            },
            None => backend.query_stream(prompt, options).await,
        };
        opened.map_err(|e| self.backend_error(e))
    }

    fn backend_error(&self, error: BackendError) -> AskError {
        if error.is_cancelled() {
            return AskError::Cancelled;
        }
        AskError::Backend {
            seat: self.seat.name().to_string(),
            source: error,
        }
    }
}
