//! Synthesis output types.

use super::claim::Polarity;
use serde::{Deserialize, Serialize};

/// One side of a disagreement: which sources hold it and a representative
/// sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub sources: Vec<String>,
    pub view: String,
    pub stance: Polarity,
}

/// A topic on which sources took opposite stances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disagreement {
    /// Up to four shared tokens, space-joined
    pub topic: String,
    pub positions: Vec<Position>,
}

/// The densest proposition of one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInsight {
    pub source: String,
    pub insight: String,
}

/// Cross-response synthesis of one deliberation.
///
/// Derived purely from the successful responses; recomputed on every call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SynthesisData {
    pub agreement_points: Vec<String>,
    pub disagreements: Vec<Disagreement>,
    pub key_insights: Vec<KeyInsight>,
    /// Net agreement in `[0, 1]`; 0.5 means no signal either way
    pub confidence: f64,
}

impl SynthesisData {
    /// Synthesis of an empty response set: nothing found, confidence 0.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.agreement_points.is_empty()
            && self.disagreements.is_empty()
            && self.key_insights.is_empty()
    }
}
