//! Output format value object

use serde::{Deserialize, Serialize};

/// Output format for consultation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every seat's answer (or error) followed by the synthesis
    Full,
    /// Only the synthesis (default)
    #[default]
    Synthesis,
    /// Machine-readable JSON
    Json,
}
