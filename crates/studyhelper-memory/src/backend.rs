//! Snippet backend trait for pluggable storage.
//!
//! [`SnippetBackend`] is what higher layers talk to. [`MemoryStore`] is the
//! SQLite implementation; [`MockSnippetBackend`] keeps everything in a `Vec`
//! and does a brute-force nearest-neighbour scan, which is enough for tests.

use parking_lot::Mutex;

use crate::error::{MemoryError, Result};
use crate::store::MemoryStore;
use crate::types::{Snippet, SnippetId};

/// Trait for snippet storage backends.
///
/// All implementations must be `Send + Sync` so a backend can be shared
/// behind an `Arc`.
pub trait SnippetBackend: Send + Sync {
    /// Store a snippet with its embedding.
    fn insert(&self, snippet: &Snippet, embedding: &[f32]) -> Result<()>;

    /// Get a snippet by id. Returns `Ok(None)` if it does not exist.
    fn get(&self, id: SnippetId) -> Result<Option<Snippet>>;

    /// Return up to `limit` snippets nearest to `query`, most similar first,
    /// paired with their distance.
    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(Snippet, f32)>>;
}

impl SnippetBackend for MemoryStore {
    fn insert(&self, snippet: &Snippet, embedding: &[f32]) -> Result<()> {
        validate_embedding(embedding)?;
        self.insert_snippet_with_embedding(snippet, embedding)
    }

    fn get(&self, id: SnippetId) -> Result<Option<Snippet>> {
        self.get_snippet(id)
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(Snippet, f32)>> {
        validate_embedding(query)?;
        self.search_similar_snippets(query, limit)
    }
}

/// Reject empty vectors and vectors containing NaN or infinity.
pub fn validate_embedding(embedding: &[f32]) -> Result<()> {
    if embedding.is_empty() {
        return Err(MemoryError::InvalidData("embedding is empty".to_string()));
    }
    if let Some(pos) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(MemoryError::InvalidData(format!(
            "embedding has a non-finite value at index {pos}"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory snippet backend for testing.
#[derive(Debug, Default)]
pub struct MockSnippetBackend {
    snippets: Mutex<Vec<(Snippet, Vec<f32>)>>,
}

impl MockSnippetBackend {
    /// Create a new empty mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored snippets.
    pub fn len(&self) -> usize {
        self.snippets.lock().len()
    }

    /// Check if the backend is empty.
    pub fn is_empty(&self) -> bool {
        self.snippets.lock().is_empty()
    }

    /// All stored snippet texts, in insertion order.
    pub fn contents(&self) -> Vec<String> {
        self.snippets
            .lock()
            .iter()
            .map(|(s, _)| s.content.clone())
            .collect()
    }
}

impl SnippetBackend for MockSnippetBackend {
    fn insert(&self, snippet: &Snippet, embedding: &[f32]) -> Result<()> {
        validate_embedding(embedding)?;
        self.snippets
            .lock()
            .push((snippet.clone(), embedding.to_vec()));
        Ok(())
    }

    fn get(&self, id: SnippetId) -> Result<Option<Snippet>> {
        Ok(self
            .snippets
            .lock()
            .iter()
            .find(|(s, _)| s.id == id)
            .map(|(s, _)| s.clone()))
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(Snippet, f32)>> {
        let snippets = self.snippets.lock();
        let mut scored: Vec<(Snippet, f32)> = snippets
            .iter()
            .filter(|(_, e)| e.len() == query.len())
            .map(|(s, e)| (s.clone(), l2_distance(query, e)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(limit);
        Ok(scored)
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
