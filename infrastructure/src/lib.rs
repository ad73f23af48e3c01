//! Infrastructure layer for council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: model backends, the fallback group,
//! configuration file loading and the consultation log.

pub mod config;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileCandidateConfig, FileConfig, FileOutputConfig,
    FileSeatConfig,
};
pub use logging::JsonlConsultationLogger;
pub use providers::{
    CommandBackend, CommandBackendConfig, FallbackGroup, HttpBackend, HttpBackendConfig,
    RegistryError, adhoc_seats, build_seats,
};
