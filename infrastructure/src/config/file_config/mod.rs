//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod output;
mod providers;
mod seats;

pub use output::FileOutputConfig;
pub use providers::{FileHttpConfig, FileProvidersConfig};
pub use seats::{FileCandidateConfig, FileSeatConfig};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("seat name cannot be empty")]
    EmptySeatName,

    #[error("seat '{0}' is defined more than once")]
    DuplicateSeat(String),

    #[error("seat '{0}' has no candidates")]
    NoCandidates(String),

    #[error("seat '{0}': model name cannot be empty")]
    EmptyModelName(String),

    #[error("seat '{0}': program cannot be empty")]
    EmptyProgram(String),

    #[error("timeout_seconds cannot be 0")]
    InvalidTimeout,
}

/// Raw fallback configuration from TOML (`[fallback]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFallbackConfig {
    /// Seconds a failed candidate is skipped for
    pub cooldown_secs: u64,
}

impl Default for FileFallbackConfig {
    fn default() -> Self {
        Self { cooldown_secs: 60 }
    }
}

impl FileFallbackConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Raw logging configuration from TOML (`[logging]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving one record per consultation event
    pub consultation_log: Option<PathBuf>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub fallback: FileFallbackConfig,
    pub providers: FileProvidersConfig,
    /// Seats in consultation order
    pub seats: Vec<FileSeatConfig>,
    pub output: FileOutputConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Some(0) = self.providers.http.timeout_seconds {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        let mut seen = HashSet::new();
        for seat in &self.seats {
            let name = seat.name.trim();
            if name.is_empty() {
                return Err(ConfigValidationError::EmptySeatName);
            }
            if !seen.insert(name) {
                return Err(ConfigValidationError::DuplicateSeat(name.to_string()));
            }
            if seat.candidates.is_empty() {
                return Err(ConfigValidationError::NoCandidates(name.to_string()));
            }

            for candidate in &seat.candidates {
                match candidate {
                    FileCandidateConfig::Http { model, .. } if model.trim().is_empty() => {
                        return Err(ConfigValidationError::EmptyModelName(name.to_string()));
                    }
                    FileCandidateConfig::Command { program, .. } if program.trim().is_empty() => {
                        return Err(ConfigValidationError::EmptyProgram(name.to_string()));
                    }
                    FileCandidateConfig::Command {
                        timeout_seconds: Some(0),
                        ..
                    } => return Err(ConfigValidationError::InvalidTimeout),
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
