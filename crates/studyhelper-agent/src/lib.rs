//! Study helper core.
//!
//! [`StudyHelper::process`] stores a document in semantic memory, pulls the
//! most similar earlier documents back out as context, and then either builds
//! a local preview or asks an LLM for a full study guide.
//!
//! ```text
//! text ──► StudyMemory::add ──► StudyMemory::retrieve(k)
//!                                     │
//!                  ┌──────────────────┴──────────────────┐
//!            use_api = false                       use_api = true
//!                  │                                     │
//!        clean + split sentences            study_guide_prompt ──► LlmBackend
//!                  │                                     │
//!         StudyResult::Preview                 StudyResult::Guide / Error
//! ```
//!
//! Dependencies are passed in explicitly, so tests swap in
//! [`studyhelper_memory::MockSnippetBackend`], a hash embedder and
//! [`studyhelper_llm::MockBackend`].

pub mod error;
pub mod helper;
pub mod memory;
pub mod prompt;
pub mod result;
pub mod text;

pub use error::{AgentError, Result};
pub use helper::{MOCK_SCHEDULE, StudyHelper, StudyOptions};
pub use memory::{SemanticMemory, SharedMemory, StudyMemory};
pub use prompt::study_guide_prompt;
pub use result::StudyResult;
pub use text::{clean_text_block, leading_sentences, truncate_chars};
