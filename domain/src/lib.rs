//! Domain layer for council
//!
//! This crate contains the core value objects and the synthesis engine.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Deliberation
//!
//! One prompt is sent to every configured **seat** (a logical model family
//! backed by a fallback group). Each seat settles into exactly one
//! [`BackendResponse`], successful or not, and the set of responses forms a
//! [`DeliberationResult`].
//!
//! ## Synthesis
//!
//! The [`SynthesisEngine`] compares the successful responses lexically and
//! reports agreement points, disagreement clusters, one attributed insight
//! per source, and a confidence score in `[0, 1]`. It never calls a model.

pub mod config;
pub mod core;
pub mod deliberation;
pub mod synthesis;
pub mod util;

// Re-export commonly used types
pub use config::OutputFormat;
pub use core::{attachment::Attachment, error::DomainError, question::Question};
pub use deliberation::{
    stream::StreamEvent,
    value_objects::{BackendResponse, DeliberationResult, SeatProgress},
};
pub use synthesis::{
    claim::{Claim, Polarity},
    engine::{SynthesisConfig, SynthesisEngine},
    value_objects::{Disagreement, KeyInsight, Position, SynthesisData},
};
