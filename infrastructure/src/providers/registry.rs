//! Builds the seat roster from configuration.

use super::command::{CommandBackend, CommandBackendConfig};
use super::fallback::{EmptyGroupError, FallbackGroup};
use super::http::{DEFAULT_TIMEOUT, HttpBackend, HttpBackendConfig};
use crate::config::{ConfigValidationError, FileCandidateConfig, FileConfig, FileSeatConfig};
use council_application::{BackendError, ModelBackend, Seat};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No seats configured; add [[seats]] to council.toml or pass --seat")]
    NoSeats,

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigValidationError),

    #[error("seat '{seat}': {source}")]
    Backend {
        seat: String,
        #[source]
        source: BackendError,
    },

    #[error(transparent)]
    EmptyGroup(#[from] EmptyGroupError),
}

/// One single-candidate HTTP seat per model, named after the model.
pub fn adhoc_seats(models: &[String]) -> Vec<FileSeatConfig> {
    models
        .iter()
        .map(|model| FileSeatConfig {
            name: model.clone(),
            candidates: vec![FileCandidateConfig::http(model.clone())],
        })
        .collect()
}

/// Build every configured seat as a fallback group, reading API keys from
/// the process environment.
pub fn build_seats(config: &FileConfig) -> Result<Vec<Seat>, RegistryError> {
    build_seats_with(config, |name| std::env::var(name).ok())
}

/// Like [`build_seats`] with an explicit environment lookup.
pub fn build_seats_with<F>(config: &FileConfig, env: F) -> Result<Vec<Seat>, RegistryError>
where
    F: Fn(&str) -> Option<String>,
{
    config.validate()?;
    if config.seats.is_empty() {
        return Err(RegistryError::NoSeats);
    }

    let cooldown = config.fallback.cooldown();
    config
        .seats
        .iter()
        .map(|seat| -> Result<Seat, RegistryError> {
            let candidates = seat
                .candidates
                .iter()
                .map(|candidate| build_candidate(config, candidate, &env))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| RegistryError::Backend {
                    seat: seat.name.clone(),
                    source,
                })?;

            debug!(
                seat = %seat.name,
                candidates = candidates.len(),
                cooldown_secs = cooldown.as_secs(),
                "Built seat"
            );
            let group = FallbackGroup::new(seat.name.clone(), candidates, cooldown)?;
            Ok(Seat::new(seat.name.clone(), Arc::new(group)))
        })
        .collect()
}

fn build_candidate<F>(
    config: &FileConfig,
    candidate: &FileCandidateConfig,
    env: &F,
) -> Result<Arc<dyn ModelBackend>, BackendError>
where
    F: Fn(&str) -> Option<String>,
{
    match candidate {
        FileCandidateConfig::Http {
            model,
            base_url,
            api_key_env,
        } => {
            let defaults = &config.providers.http;
            let key_env = api_key_env.as_deref().unwrap_or(&defaults.api_key_env);
            let api_key = env(key_env);
            if api_key.is_none() {
                warn!(model = %model, env = key_env, "API key variable not set, sending no auth");
            }

            let backend = HttpBackend::new(HttpBackendConfig {
                model: model.clone(),
                base_url: base_url.clone().unwrap_or_else(|| defaults.base_url.clone()),
                api_key,
                timeout: defaults
                    .timeout_seconds
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_TIMEOUT),
                max_tokens: defaults.max_tokens,
            })?;
            Ok(Arc::new(backend))
        }
        FileCandidateConfig::Command {
            program,
            args,
            prompt_arg,
            timeout_seconds,
        } => {
            let backend = CommandBackend::new(CommandBackendConfig {
                program: program.clone(),
                args: args.clone(),
                prompt_arg: *prompt_arg,
                timeout: timeout_seconds.map(Duration::from_secs),
            });
            Ok(Arc::new(backend))
        }
    }
}
