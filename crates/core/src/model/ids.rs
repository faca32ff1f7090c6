use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a Question
///
/// Questions are keyed by opaque string ids, matching the document-store
/// convention that ids are minted once and never reinterpreted.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a `QuestionId` from an existing id string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random id
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the underlying id string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a `ProgressRecord`
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a `RecordId` from an existing id string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random id
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the underlying id string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseIdError {
                kind: "QuestionId".to_string(),
            });
        }
        Ok(QuestionId::new(s))
    }
}

impl FromStr for RecordId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseIdError {
                kind: "RecordId".to_string(),
            });
        }
        Ok(RecordId::new(s))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_id_display() {
        let id = QuestionId::new("q-42");
        assert_eq!(id.to_string(), "q-42");
    }

    #[test]
    fn test_question_id_from_str() {
        let id: QuestionId = "abc123".parse().unwrap();
        assert_eq!(id, QuestionId::new("abc123"));
    }

    #[test]
    fn test_question_id_from_str_blank() {
        let result = "   ".parse::<QuestionId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_record_id_display() {
        let id = RecordId::new("r-99");
        assert_eq!(id.to_string(), "r-99");
    }

    #[test]
    fn test_record_id_from_str_blank() {
        let result = "".parse::<RecordId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_generate_is_unique() {
        let a = QuestionId::generate();
        let b = QuestionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_roundtrip() {
        let original = RecordId::generate();
        let serialized = original.to_string();
        let deserialized: RecordId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }
}
