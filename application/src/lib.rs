//! Application layer for council
//!
//! This crate contains use cases and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    backend::{BackendError, BackendReply, ModelBackend, QueryOptions, StreamHandle},
    consultation_logger::{ConsultationEvent, ConsultationLogger, NoConsultationLogger},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::ask::{AskError, AskUseCase};
pub use use_cases::consult::{ConsultInput, ConsultOutput, ConsultUseCase};
pub use use_cases::deliberate::{DispatchError, Dispatcher, Seat};
