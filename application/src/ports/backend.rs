//! Model backend port
//!
//! Defines the single capability every model family implements: text in,
//! text out, can fail, can be cancelled. The dispatcher and the fallback
//! group are written only against this interface.

use async_trait::async_trait;
use council_domain::{Attachment, StreamEvent};
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during backend queries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The caller's cancellation token fired. Never retried.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Other error: {0}")]
    Other(String),
}

impl BackendError {
    /// Check if this error represents a caller-initiated cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BackendError::Cancelled)
    }
}

/// Per-query options threaded through every layer.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub attachments: Vec<Attachment>,
    pub cancellation: Option<CancellationToken>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Whether the cancellation token (if any) has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Return `Err(BackendError::Cancelled)` if cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), BackendError> {
        if self.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        Ok(())
    }

    /// Prompt text with text attachments inlined after it.
    ///
    /// For backends that only accept plain text. Binary attachments are
    /// rejected with [`BackendError::Unsupported`].
    pub fn render_prompt(&self, prompt: &str) -> Result<String, BackendError> {
        let mut rendered = prompt.to_string();
        for attachment in &self.attachments {
            let inline = attachment.inline_text().ok_or_else(|| {
                BackendError::Unsupported(format!(
                    "binary attachment '{}' ({})",
                    attachment.name(),
                    attachment.mime_type()
                ))
            })?;
            rendered.push_str("\n\n");
            rendered.push_str(&inline);
        }
        Ok(rendered)
    }
}

/// A completed backend answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub text: String,
    /// Identifies the concrete backend (e.g. the model id) that answered
    pub source_id: String,
    pub latency: Duration,
    pub tokens_used: Option<u64>,
}

impl BackendReply {
    pub fn new(text: impl Into<String>, source_id: impl Into<String>, latency: Duration) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            latency,
            tokens_used: None,
        }
    }

    pub fn with_tokens_used(mut self, tokens_used: Option<u64>) -> Self {
        self.tokens_used = tokens_used;
        self
    }
}

/// Handle for receiving streaming events from a backend.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. Events already read by an
/// intermediary (e.g. a fallback group probing the first chunk) can be
/// pushed back with [`StreamHandle::prepend`].
pub struct StreamHandle {
    pending: VecDeque<StreamEvent>,
    receiver: mpsc::Receiver<StreamEvent>,
    source_id: Option<String>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self {
            pending: VecDeque::new(),
            receiver,
            source_id: None,
        }
    }

    /// A handle whose first event is `first`, followed by whatever
    /// `receiver` yields.
    pub fn with_first(first: StreamEvent, receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self::new(receiver).prepend(first)
    }

    /// A single-event stream carrying the complete text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let (_tx, rx) = mpsc::channel(1);
        Self::with_first(StreamEvent::Completed(text.into()), rx)
    }

    /// Put an event back at the front of the stream.
    pub fn prepend(mut self, event: StreamEvent) -> Self {
        self.pending.push_front(event);
        self
    }

    /// Tag the stream with the concrete backend producing it.
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    /// Next event, or `None` once the producer is gone.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        self.receiver.recv().await
    }

    /// Consume the stream and collect all text into a single string.
    ///
    /// The `Completed` text is the final answer; deltas only matter when the
    /// producer goes away without one.
    pub async fn collect_text(mut self) -> Result<String, BackendError> {
        let mut full_text = String::new();
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => return Ok(text),
                StreamEvent::Error(e) => return Err(BackendError::RequestFailed(e)),
            }
        }
        // Channel closed without Completed, return what we have
        Ok(full_text)
    }
}

/// A model backend: one concrete model, or a composite such as a fallback
/// group, behind the same interface.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Human-readable identifier used in logs and as the reply's source id.
    fn name(&self) -> &str;

    /// Send a prompt and wait for the complete answer.
    async fn query(&self, prompt: &str, options: &QueryOptions)
    -> Result<BackendReply, BackendError>;

    /// Send a prompt and receive the answer incrementally.
    ///
    /// Default implementation calls `query()` and wraps the result in a
    /// single `Completed` event.
    async fn query_stream(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<StreamHandle, BackendError> {
        let reply = self.query(prompt, options).await?;
        Ok(StreamHandle::from_text(reply.text).with_source_id(reply.source_id))
    }
}
