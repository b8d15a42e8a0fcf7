//! Study helper output.

use serde::{Deserialize, Serialize};

/// Outcome of one [`StudyHelper::process`](crate::StudyHelper::process) call.
///
/// Serializes to a flat map whose keys depend on the variant, e.g.
/// `{"error": "..."}` for failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudyResult {
    /// Local, offline preview.
    Preview {
        content: String,
        summary: String,
        key_concepts: Vec<String>,
        mock_schedule: String,
    },
    /// Study guide produced by the language model.
    Guide { content: String },
    /// Something went wrong; the message is meant for the user.
    Error { error: String },
}

impl StudyResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// The main text, if this is not an error.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Preview { content, .. } | Self::Guide { content } => Some(content.as_str()),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error.as_str()),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let guide = StudyResult::Guide {
            content: "guide".into(),
        };
        assert_eq!(guide.content(), Some("guide"));
        assert!(!guide.is_error());

        let err = StudyResult::error("boom");
        assert_eq!(err.content(), None);
        assert_eq!(err.error_message(), Some("boom"));
        assert!(err.is_error());
    }

    #[test]
    fn test_serialized_keys() {
        let preview = StudyResult::Preview {
            content: "c".into(),
            summary: "s".into(),
            key_concepts: vec!["k".into()],
            mock_schedule: "m".into(),
        };
        assert_eq!(
            serde_json::to_value(&preview).unwrap(),
            json!({"content": "c", "summary": "s", "key_concepts": ["k"], "mock_schedule": "m"})
        );
        assert_eq!(
            serde_json::to_value(StudyResult::error("bad")).unwrap(),
            json!({"error": "bad"})
        );
    }

    #[test]
    fn test_deserialize_picks_variant() {
        let guide: StudyResult = serde_json::from_value(json!({"content": "g"})).unwrap();
        assert_eq!(guide, StudyResult::Guide { content: "g".into() });

        let err: StudyResult = serde_json::from_value(json!({"error": "e"})).unwrap();
        assert!(err.is_error());
    }
}
