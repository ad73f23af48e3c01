//! Structured consultation logging.
//!
//! Provides [`JsonlConsultationLogger`], a JSONL file writer that implements
//! the [`ConsultationLogger`](council_application::ConsultationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlConsultationLogger;
