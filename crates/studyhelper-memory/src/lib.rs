//! Persistent semantic memory for studyhelper.
//!
//! Every processed document is stored as a snippet alongside its embedding.
//! Later documents retrieve the most similar snippets as context.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MemoryStore                                                            │
//! │  - One SQLite file per collection: <dir>/<collection>.db (WAL mode)     │
//! │  - snippets table: id, content, created_at                              │
//! │  - snippet_embeddings: sqlite-vec vec0 table for KNN search             │
//! │  - meta table: embedding dimensions + provider                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use studyhelper_memory::{MemoryStore, Snippet, DEFAULT_COLLECTION};
//!
//! let store = MemoryStore::open("./memory_db", DEFAULT_COLLECTION)?;
//! store.init_vectors(384, "local")?;
//!
//! let embedding = vec![0.0_f32; 384];
//! store.insert_snippet_with_embedding(&Snippet::new("Cells divide by mitosis."), &embedding)?;
//!
//! let similar = store.search_similar_snippets(&embedding, 3)?;
//! # Ok::<(), studyhelper_memory::MemoryError>(())
//! ```

pub mod backend;
pub mod error;
pub mod store;
pub mod types;
pub mod vector;

pub use backend::{MockSnippetBackend, SnippetBackend, validate_embedding};
pub use error::{MemoryError, Result};
pub use store::{DEFAULT_COLLECTION, MemoryStore};
pub use types::{Snippet, SnippetId, StoreStats};
pub use vector::{
    DEFAULT_EMBEDDING_DIMS, SimilarityResult, count_embeddings, create_vector_table,
    init_vector_extension, search_similar, store_embedding,
};
