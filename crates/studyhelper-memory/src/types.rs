//! Snippet types stored in the memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stored snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(pub Uuid);

impl SnippetId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its string form.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SnippetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SnippetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A text snippet held in memory.
///
/// Snippets are append-only: once stored they are never updated or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Unique id.
    pub id: SnippetId,
    /// The stored text, verbatim.
    pub content: String,
    /// When the snippet was stored.
    pub created_at: DateTime<Utc>,
}

impl Snippet {
    /// Create a new snippet stamped with the current time.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: SnippetId::new(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Aggregate statistics about a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of stored snippets.
    pub snippet_count: usize,
    /// Number of stored embeddings.
    pub embedding_count: usize,
    /// Embedding dimensions recorded for this store, if any.
    pub dimensions: Option<usize>,
    /// Embedding provider recorded for this store, if any.
    pub provider: Option<String>,
}
