//! Seat roster from TOML (`[[seats]]` array)

use serde::{Deserialize, Serialize};

/// One seat and its ordered fallback candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSeatConfig {
    pub name: String,
    #[serde(default)]
    pub candidates: Vec<FileCandidateConfig>,
}

/// One concrete backend inside a seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileCandidateConfig {
    /// OpenAI-compatible chat completions endpoint
    Http {
        model: String,
        /// Overrides `[providers.http] base_url`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
        /// Overrides `[providers.http] api_key_env`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key_env: Option<String>,
    },
    /// Local model CLI
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        /// Pass the prompt as the last argument instead of on stdin
        #[serde(default)]
        prompt_arg: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u64>,
    },
}

impl FileCandidateConfig {
    /// Shorthand for an HTTP candidate using the provider defaults.
    pub fn http(model: impl Into<String>) -> Self {
        Self::Http {
            model: model.into(),
            base_url: None,
            api_key_env: None,
        }
    }

    /// Human-readable label for logs and `--show-config`.
    pub fn label(&self) -> String {
        match self {
            Self::Http { model, .. } => format!("http:{model}"),
            Self::Command { program, .. } => format!("command:{program}"),
        }
    }
}
