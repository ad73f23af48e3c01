//! Heuristic synthesis across independently generated answers.
//!
//! The engine works purely on lexical overlap: every successful response is
//! split into sentence-like units, each unit becomes a [`Claim`] (a sorted set
//! of content tokens plus a polarity), and claims are compared across sources.
//!
//! ```text
//!  responses ──▶ segment ──▶ claims ──┬──▶ agreement points (shared keys)
//!                                     ├──▶ pairwise overlap ──▶ disagreements
//!                                     │                     └─▶ confidence
//!                                     └──▶ densest claim per source ──▶ insights
//! ```
//!
//! This is a bounded heuristic, not entailment: paraphrases can produce false
//! agreement or disagreement and synonyms go unnoticed. The thresholds live in
//! [`SynthesisConfig`] and are tunable.

pub mod claim;
pub mod engine;
pub mod value_objects;

pub use claim::{Claim, Polarity};
pub use engine::{SynthesisConfig, SynthesisEngine};
pub use value_objects::{Disagreement, KeyInsight, Position, SynthesisData};
