//! The study helper: memory lookup, preview, and study guide generation.

use tracing::{debug, info, warn};

use studyhelper_llm::{CompletionRequest, Message, SharedBackend};

use crate::error::Result;
use crate::memory::SharedMemory;
use crate::prompt::study_guide_prompt;
use crate::result::StudyResult;
use crate::text::{clean_text_block, leading_sentences, truncate_chars};

/// Fixed schedule returned by previews.
pub const MOCK_SCHEDULE: &str =
    "Day 1: Read introduction\nDay 2: Review key concepts\nDay 3: Practice questions";

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning knobs for [`StudyHelper`].
#[derive(Debug, Clone, PartialEq)]
pub struct StudyOptions {
    /// Model requested from the LLM backend.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// How many similar memory entries to pull in as context.
    pub retrieve_limit: usize,
    /// Characters of cleaned text shown in a preview.
    pub preview_chars: usize,
    /// Characters of cleaned memory context shown in a preview.
    pub memory_preview_chars: usize,
    /// Maximum number of sentences used for the summary and key concepts.
    pub max_key_concepts: usize,
}

impl Default for StudyOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            retrieve_limit: 3,
            preview_chars: 1000,
            memory_preview_chars: 500,
            max_key_concepts: 5,
        }
    }
}

impl StudyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retrieve_limit(mut self, limit: usize) -> Self {
        self.retrieve_limit = limit;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper
// ─────────────────────────────────────────────────────────────────────────────

/// Turns document text into a preview or an LLM study guide.
///
/// Every call to [`process`](Self::process) stores the text in memory first,
/// so later documents can draw on it as context.
pub struct StudyHelper {
    memory: SharedMemory,
    llm: SharedBackend,
    options: StudyOptions,
}

impl std::fmt::Debug for StudyHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyHelper")
            .field("llm", &self.llm.name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl StudyHelper {
    pub fn new(memory: SharedMemory, llm: SharedBackend, options: StudyOptions) -> Self {
        Self {
            memory,
            llm,
            options,
        }
    }

    /// Process one document.
    ///
    /// With `use_api == false` the result is a local [`StudyResult::Preview`]
    /// and the LLM is never contacted. Failures are returned as
    /// [`StudyResult::Error`] rather than raised.
    pub async fn process(&self, text: &str, use_api: bool) -> StudyResult {
        match self.try_process(text, use_api).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, use_api, "Study helper failed");
                StudyResult::error(e.to_string())
            }
        }
    }

    async fn try_process(&self, text: &str, use_api: bool) -> Result<StudyResult> {
        self.memory.add(text).await?;
        let memory_context = self
            .memory
            .retrieve(text, self.options.retrieve_limit)
            .await?;
        debug!(
            text_chars = text.chars().count(),
            context_chars = memory_context.chars().count(),
            "Memory context ready"
        );

        if !use_api {
            return Ok(self.preview(text, &memory_context));
        }
        Ok(self.study_guide(text, &memory_context).await)
    }

    /// Build a preview from raw text and memory context. Pure string work.
    pub fn preview(&self, text: &str, memory_context: &str) -> StudyResult {
        let clean_text = clean_text_block(text);
        let clean_memory = clean_text_block(memory_context);

        let sentences = leading_sentences(&clean_text, self.options.max_key_concepts);
        let summary = sentences.join(" ");
        // Splitting empty text yields one empty piece; that is no concept.
        let key_concepts = if clean_text.is_empty() {
            Vec::new()
        } else {
            sentences.iter().map(|s| s.trim().to_string()).collect()
        };

        let content = format!(
            "Processed document preview:\n{}...\nMemory context:\n{}...",
            truncate_chars(&clean_text, self.options.preview_chars),
            truncate_chars(&clean_memory, self.options.memory_preview_chars),
        );

        StudyResult::Preview {
            content,
            summary,
            key_concepts,
            mock_schedule: MOCK_SCHEDULE.to_string(),
        }
    }

    async fn study_guide(&self, text: &str, memory_context: &str) -> StudyResult {
        let prompt = study_guide_prompt(text, memory_context);
        let request = CompletionRequest::new(
            self.options.model.clone(),
            vec![Message::user(prompt)],
            self.options.max_tokens,
        )
        .with_temperature(self.options.temperature);

        info!(backend = self.llm.name(), model = %self.options.model, "Requesting study guide");
        match self.llm.complete(request).await {
            Ok(response) => {
                debug!(
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Study guide received"
                );
                let content = response.text();
                if content.trim().is_empty() {
                    warn!(
                        backend = self.llm.name(),
                        id = %response.id,
                        "Study guide response was empty"
                    );
                    return StudyResult::error(format!(
                        "API error ({}): response contained no text",
                        self.llm.name()
                    ));
                }
                StudyResult::Guide { content }
            }
            Err(e) => {
                warn!(backend = self.llm.name(), error = %e, "Study guide request failed");
                StudyResult::error(format!("API error ({}): {}", self.llm.name(), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use studyhelper_llm::{
        CompletionResponse, EmbeddingFunction, HashEmbedder, LlmError, MockBackend, Role,
        StopReason, Usage,
    };
    use studyhelper_memory::MockSnippetBackend;

    use crate::error::AgentError;
    use crate::memory::{SemanticMemory, StudyMemory};

    struct Fixture {
        store: Arc<MockSnippetBackend>,
        llm: Arc<MockBackend>,
        helper: StudyHelper,
    }

    fn fixture(llm: MockBackend) -> Fixture {
        let store = Arc::new(MockSnippetBackend::new());
        let embedding = EmbeddingFunction::new(Arc::new(HashEmbedder::new(64)));
        let memory = Arc::new(SemanticMemory::new(store.clone(), embedding));
        let llm = Arc::new(llm);
        let helper = StudyHelper::new(memory, llm.clone(), StudyOptions::default());
        Fixture { store, llm, helper }
    }

    struct BrokenMemory;

    #[async_trait]
    impl StudyMemory for BrokenMemory {
        async fn add(&self, _text: &str) -> Result<()> {
            Err(AgentError::internal("disk full"))
        }

        async fn retrieve(&self, _query: &str, _k: usize) -> Result<String> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_preview_of_empty_text() {
        let f = fixture(MockBackend::new(vec![]));
        let result = f.helper.process("", false).await;

        match result {
            StudyResult::Preview {
                summary,
                key_concepts,
                mock_schedule,
                ..
            } => {
                assert_eq!(summary, "");
                assert!(key_concepts.is_empty());
                assert_eq!(mock_schedule, MOCK_SCHEDULE);
            }
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_preview_two_paragraphs() {
        let f = fixture(MockBackend::new(vec![]));
        let result = f.helper.process("Intro.\n\nDetails here.", false).await;

        let StudyResult::Preview {
            content,
            key_concepts,
            ..
        } = result
        else {
            panic!("expected preview");
        };
        assert!(content.starts_with("Processed document preview:"));
        assert!(content.contains("Intro.\n\nDetails here....\nMemory context:\n"));
        assert!(key_concepts.len() <= 5);
    }

    #[tokio::test]
    async fn test_preview_never_calls_llm() {
        let f = fixture(MockBackend::new(vec![]));
        f.helper.process("Some text. More text.", false).await;
        assert_eq!(f.llm.request_count(), 0);
    }

    #[tokio::test]
    async fn test_every_call_writes_memory() {
        let f = fixture(MockBackend::with_text("guide"));
        f.helper.process("first", false).await;
        f.helper.process("second", false).await;
        f.helper.process("third", true).await;
        assert_eq!(f.store.contents(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_key_concepts_capped_at_five() {
        let f = fixture(MockBackend::new(vec![]));
        let text = "One is first. Two is second. Three. Four. Five. Six. Seven.";
        let StudyResult::Preview {
            summary,
            key_concepts,
            ..
        } = f.helper.process(text, false).await
        else {
            panic!("expected preview");
        };
        assert_eq!(
            key_concepts,
            vec!["One is first", "Two is second", "Three", "Four", "Five"]
        );
        assert_eq!(summary, "One is first Two is second Three Four Five");
    }

    #[test]
    fn test_key_concepts_keep_empty_pieces() {
        let f = fixture(MockBackend::new(vec![]));
        let StudyResult::Preview {
            summary,
            key_concepts,
            ..
        } = f.helper.preview("a. . b", "")
        else {
            panic!("expected preview");
        };
        assert_eq!(key_concepts, vec!["a", "", "b"]);
        assert_eq!(summary, "a  b");
    }

    #[test]
    fn test_preview_truncates_by_characters() {
        let f = fixture(MockBackend::new(vec![]));
        let text = "é".repeat(1500);
        let memory = "ü".repeat(800);

        let result = f.helper.preview(&text, &memory);
        let content = result.content().unwrap();
        let expected = format!(
            "Processed document preview:\n{}...\nMemory context:\n{}...",
            "é".repeat(1000),
            "ü".repeat(500)
        );
        assert_eq!(content, expected);
    }

    #[tokio::test]
    async fn test_memory_context_includes_current_text() {
        let f = fixture(MockBackend::new(vec![]));
        let result = f.helper.process("Enzymes lower activation energy", false).await;
        let content = result.content().unwrap();
        assert!(content.ends_with("Memory context:\nEnzymes lower activation energy..."));
    }

    #[tokio::test]
    async fn test_study_guide_uses_llm() {
        let f = fixture(MockBackend::with_text("# Study Guide\n..."));
        f.helper.process("Earlier notes on cells", false).await;

        let result = f.helper.process("Cells   divide.", true).await;
        assert_eq!(
            result,
            StudyResult::Guide {
                content: "# Study Guide\n...".to_string()
            }
        );

        let requests = f.llm.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "gpt-3.5-turbo");
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        // Raw text, not the cleaned version.
        assert!(request.messages[0].content.contains("New Material: Cells   divide.\n"));
        assert!(request.messages[0].content.contains("Earlier notes on cells"));
    }

    #[tokio::test]
    async fn test_study_guide_error_is_returned() {
        let f = fixture(MockBackend::with_error(LlmError::Auth(
            "invalid api key".to_string(),
        )));
        let result = f.helper.process("text", true).await;

        let message = result.error_message().unwrap();
        assert!(message.starts_with("API error (mock): "));
        assert!(message.contains("invalid api key"));
        // Memory is still written before the model call.
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_model_response_is_error() {
        let empty =
            CompletionResponse::new("id", "m", vec![], StopReason::EndTurn, Usage::default());
        let f = fixture(MockBackend::new(vec![empty]));

        let result = f.helper.process("Cells divide.", true).await;
        assert!(result.is_error());
        assert_eq!(
            result.error_message(),
            Some("API error (mock): response contained no text")
        );
    }

    #[tokio::test]
    async fn test_memory_failure_becomes_error() {
        let llm = Arc::new(MockBackend::new(vec![]));
        let helper = StudyHelper::new(Arc::new(BrokenMemory), llm.clone(), StudyOptions::default());

        for use_api in [false, true] {
            let result = helper.process("text", use_api).await;
            assert_eq!(result.error_message(), Some("Internal error: disk full"));
        }
        assert_eq!(llm.request_count(), 0);
    }

    #[test]
    fn test_options_builder() {
        let options = StudyOptions::new()
            .with_model("llama3")
            .with_temperature(0.5)
            .with_max_tokens(512)
            .with_retrieve_limit(5);
        assert_eq!(options.model, "llama3");
        assert_eq!(options.temperature, 0.5);
        assert_eq!(options.max_tokens, 512);
        assert_eq!(options.retrieve_limit, 5);
        assert_eq!(options.preview_chars, 1000);
    }
}
