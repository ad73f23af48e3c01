//! Question value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// A question to put to every seat (Value Object)
///
/// Guaranteed non-blank. The same text is sent, unmodified, to each backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question {
    content: String,
}

impl Question {
    /// Create a new question, rejecting empty or whitespace-only content
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }
        Ok(Self { content })
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl std::str::FromStr for Question {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_creation() {
        let q = Question::try_new("What is Rust?").unwrap();
        assert_eq!(q.content(), "What is Rust?");
        assert_eq!(q.to_string(), "What is Rust?");
    }

    #[test]
    fn test_question_from_str() {
        let q: Question = "Which database?".parse().unwrap();
        assert_eq!(q.into_content(), "Which database?");
    }

    #[test]
    fn test_empty_question_rejected() {
        assert!(Question::try_new("").is_err());
        assert!(matches!(
            Question::try_new("   \n\t"),
            Err(DomainError::InvalidQuestion(_))
        ));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let q = Question::try_new("Why?").unwrap();
        assert_eq!(serde_json::to_string(&q).unwrap(), "\"Why?\"");
    }
}
