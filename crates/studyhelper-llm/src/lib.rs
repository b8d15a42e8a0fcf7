//! LLM and embedding client abstraction for studyhelper.
//!
//! Two traits carry the crate: [`LlmBackend`] for chat completions against a
//! hosted model, and [`Embedder`] for turning text into vectors for the
//! semantic memory.
//!
//! ```text
//! ┌─────────────────────────────┐   ┌─────────────────────────────┐
//! │  LlmBackend trait           │   │  Embedder trait             │
//! │  - complete() -> Response   │   │  - embed() / embed_batch()  │
//! └─────────────────────────────┘   └─────────────────────────────┘
//!          │                                 │
//!     ┌────┴──────┐               ┌──────────┼──────────┐
//!     ▼           ▼               ▼          ▼          ▼
//! ┌────────┐ ┌────────┐      ┌────────┐ ┌────────┐ ┌────────┐
//! │ OpenAI │ │  Mock  │      │ Local  │ │ OpenAI │ │  Hash  │
//! └────────┘ └────────┘      └────────┘ └────────┘ └────────┘
//! ```

pub mod backend;
pub mod embeddings;
pub mod error;
pub mod openai;
pub mod types;

pub use backend::{LlmBackend, MockBackend, SharedBackend, with_retry};
pub use error::{LlmError, RateLimitInfo, Result};
pub use types::{CompletionRequest, CompletionResponse, ContentBlock, Message, Role, StopReason, Usage};

// Re-export embeddings
pub use embeddings::{
    DEFAULT_DIMENSIONS, Embedder, EmbedderSpec, EmbeddingFunction, EmbeddingInput,
    EmbeddingOutput, HashEmbedder, OpenAiEmbedder, OpenAiEmbedderConfig, SharedEmbedder,
    build_embedder, default_local_model_dir,
};

// Re-export provider configs
pub use openai::{OpenAiBackend, OpenAiConfig, create_shared_backend};

// Re-export local embeddings when feature is enabled
#[cfg(feature = "local-embeddings")]
pub use embeddings::local::LocalEmbedder;
