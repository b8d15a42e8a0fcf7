//! Semantic memory used by the study helper.
//!
//! [`StudyMemory`] is the seam the helper talks to. [`SemanticMemory`] embeds
//! text with an [`EmbeddingFunction`] and stores it in any
//! [`SnippetBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use studyhelper_llm::EmbeddingFunction;
use studyhelper_memory::{Snippet, SnippetBackend};
use tracing::debug;

use crate::error::{AgentError, Result};

/// Append-only text memory with nearest-neighbour recall.
#[async_trait]
pub trait StudyMemory: Send + Sync {
    /// Embed `text` and append it as a new entry.
    async fn add(&self, text: &str) -> Result<()>;

    /// Text of the `k` entries most similar to `query`, joined by `"\n"`.
    ///
    /// Returns an empty string when nothing is stored.
    async fn retrieve(&self, query: &str, k: usize) -> Result<String>;
}

/// A memory that can be shared across the helper and the shell.
pub type SharedMemory = Arc<dyn StudyMemory>;

/// Memory backed by a snippet store and an embedding function.
pub struct SemanticMemory {
    backend: Arc<dyn SnippetBackend>,
    embedding: EmbeddingFunction,
}

impl SemanticMemory {
    pub fn new(backend: Arc<dyn SnippetBackend>, embedding: EmbeddingFunction) -> Self {
        Self { backend, embedding }
    }
}

impl std::fmt::Debug for SemanticMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticMemory")
            .field("embedding", &self.embedding)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StudyMemory for SemanticMemory {
    async fn add(&self, text: &str) -> Result<()> {
        let embedding = self
            .embedding
            .embed_documents(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::internal("embedder returned no vectors"))?;

        let snippet = Snippet::new(text);
        self.backend.insert(&snippet, &embedding)?;
        debug!(id = %snippet.id, chars = text.chars().count(), "Added snippet to memory");
        Ok(())
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<String> {
        if k == 0 {
            return Ok(String::new());
        }

        let embedding = self.embedding.embed_query(query).await?;
        let hits = self.backend.search(&embedding, k)?;
        debug!(requested = k, found = hits.len(), "Retrieved memory context");

        Ok(hits
            .into_iter()
            .map(|(snippet, _)| snippet.content)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
