//! Shared helpers for use cases.

use crate::ports::backend::{BackendError, BackendReply, ModelBackend, QueryOptions};

/// Query a backend, racing it against the cancellation token if one is set.
///
/// Returns `Err(BackendError::Cancelled)` without querying when the token
/// already fired; an in-flight query future is dropped on cancellation.
pub(crate) async fn query_cancellable(
    backend: &dyn ModelBackend,
    prompt: &str,
    options: &QueryOptions,
) -> Result<BackendReply, BackendError> {
    options.check_cancelled()?;

    match &options.cancellation {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(BackendError::Cancelled),
                result = backend.query(prompt, options) => result,
            }
        }
        None => backend.query(prompt, options).await,
    }
}

/// Error text recorded for a seat that failed.
pub(crate) fn failure_text(error: &BackendError) -> String {
    if error.is_cancelled() {
        "cancelled".to_string()
    } else {
        error.to_string()
    }
}
