//! Error types for the agent crate.

use thiserror::Error;

/// Result type alias using the agent error type.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Error type for study helper operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM or embedding error.
    #[error("LLM error: {0}")]
    Llm(#[from] studyhelper_llm::LlmError),

    /// Snippet storage error.
    #[error("Memory error: {0}")]
    Memory(#[from] studyhelper_memory::MemoryError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::internal("no vectors");
        assert_eq!(err.to_string(), "Internal error: no vectors");

        let err: AgentError =
            studyhelper_memory::MemoryError::InvalidData("vectors are stale".into()).into();
        assert_eq!(err.to_string(), "Memory error: Invalid data: vectors are stale");
    }
}
