//! Startup wiring: configuration in, a ready [`StudyHelper`] out.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use studyhelper_agent::{SemanticMemory, StudyHelper, StudyOptions};
use studyhelper_config::{Backend, EmbeddingProvider, LlmConfig, OutputConfig, StudyConfig};
use studyhelper_llm::{
    EmbedderSpec, EmbeddingFunction, OpenAiConfig, SharedBackend, build_embedder,
    create_shared_backend,
};
use studyhelper_memory::MemoryStore;

/// Everything the shell needs.
pub struct Services {
    pub helper: StudyHelper,
    pub output: OutputConfig,
    /// Startup problems worth showing the user.
    pub notes: Vec<String>,
}

/// Open the memory store, pick an embedder and LLM backend, and assemble
/// the study helper.
pub fn build(config: &StudyConfig, memory_dir: Option<&Path>) -> Result<Services> {
    let llm_config = config.llm();
    let memory_config = config.memory();
    let mut notes = Vec::new();

    let directory = memory_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| memory_config.effective_directory());
    let store = MemoryStore::open(&directory, memory_config.effective_collection())
        .with_context(|| format!("Failed to open memory store in {}", directory.display()))?;

    let embedder = build_embedder(&embedder_spec(config)).context("Failed to set up embeddings")?;
    if embedder.name() != config.embedding().provider.as_str() {
        notes.push(format!(
            "Embedding provider '{}' is unavailable, using '{}' embeddings instead.",
            config.embedding().provider.as_str(),
            embedder.name()
        ));
    }

    store.init_vectors(embedder.dimensions(), embedder.name())?;
    if store.vectors_stale() {
        notes.push(format!(
            "The memory in {} was built with different embedding dimensions. \
             Delete it or switch back to the original embedding provider.",
            directory.display()
        ));
    }

    let stats = store.stats()?;
    info!(
        memory = %directory.display(),
        snippets = stats.snippet_count,
        embeddings = stats.embedding_count,
        embedder = embedder.name(),
        dimensions = embedder.dimensions(),
        backend = %llm_config.effective_backend(),
        "Study helper ready"
    );
    if !store.vectors_stale() && stats.embedding_count < stats.snippet_count {
        notes.push(format!(
            "{} stored document(s) in {} have no usable embedding and will not be recalled.",
            stats.snippet_count - stats.embedding_count,
            directory.display()
        ));
    }

    let memory = SemanticMemory::new(Arc::new(store), EmbeddingFunction::new(embedder));
    let llm = build_llm_backend(&llm_config)?;
    let options = study_options(config);

    Ok(Services {
        helper: StudyHelper::new(Arc::new(memory), llm, options),
        output: config.output(),
        notes,
    })
}

/// Create the OpenAI-compatible client for the configured backend.
///
/// A missing API key is not an error here: the client reports it on first
/// use, so previews keep working without one.
pub fn build_llm_backend(llm: &LlmConfig) -> Result<SharedBackend> {
    let backend = llm.effective_backend();
    let api_key = studyhelper_config::resolve_api_key(&backend, llm.api_key.as_deref())
        .map(|secret| secret.value);

    let mut config = match backend {
        Backend::Openai => OpenAiConfig::openai(api_key),
        Backend::Groq => OpenAiConfig::groq(api_key),
        Backend::Ollama => OpenAiConfig::ollama(),
        Backend::Custom => {
            let mut config = OpenAiConfig::openai(api_key).with_name("custom");
            config.api_key_env = Some(backend.env_var().to_string());
            if llm.base_url.is_none() {
                warn!("Custom backend configured without [llm] base_url, using the OpenAI endpoint");
            }
            config
        }
    };

    if let Some(ref url) = llm.base_url {
        config = config.with_base_url(url);
    }
    if llm.timeout_secs.is_some() {
        config = config.with_timeout(Duration::from_secs(llm.effective_timeout_secs()));
    }
    config = config
        .with_model(llm.effective_model())
        .with_max_retries(llm.effective_retry_max());
    config.retry_backoff = Duration::from_millis(llm.effective_retry_backoff_ms());

    Ok(create_shared_backend(config)?)
}

/// Translate the `[embedding]` section into an embedder factory spec.
pub fn embedder_spec(config: &StudyConfig) -> EmbedderSpec {
    let embedding = config.embedding();
    let mut spec = EmbedderSpec {
        provider: embedding.provider.as_str().to_string(),
        dimensions: embedding.requested_dimensions(),
        ..Default::default()
    };

    match embedding.provider {
        EmbeddingProvider::OpenAi => {
            let llm = config.llm();
            spec.openai_api_key =
                studyhelper_config::resolve_api_key(&Backend::Openai, llm.api_key.as_deref())
                    .map(|secret| secret.value);
            if let Some(openai) = embedding.openai {
                spec.openai_model = Some(openai.model);
                spec.openai_base_url = openai.base_url;
            }
        }
        EmbeddingProvider::Local => {
            if let Some(local) = embedding.local {
                spec.local_model_path = local.model_path;
                spec.local_tokenizer_path = local.tokenizer_path;
            }
        }
        EmbeddingProvider::Hash => {}
    }

    spec
}

fn study_options(config: &StudyConfig) -> StudyOptions {
    let llm = config.llm();
    StudyOptions::new()
        .with_model(llm.effective_model())
        .with_temperature(llm.effective_temperature())
        .with_max_tokens(llm.effective_max_tokens())
        .with_retrieve_limit(config.memory().effective_retrieve_limit())
}
