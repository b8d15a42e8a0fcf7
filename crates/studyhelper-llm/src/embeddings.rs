//! Embeddings support for semantic memory.
//!
//! This module provides the [`Embedder`] trait, its implementations, and the
//! [`EmbeddingFunction`] wrapper the memory layer calls for both stored
//! documents and queries.
//!
//! # Implementations
//!
//! - [`HashEmbedder`]: Deterministic feature-hashing embeddings, offline
//! - [`LocalEmbedder`](local::LocalEmbedder): ONNX Runtime inference of
//!   all-MiniLM-L6-v2 (requires `local-embeddings` feature)
//! - [`OpenAiEmbedder`]: Uses OpenAI's embeddings API

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LlmError, Result};

/// Dimensions of all-MiniLM-L6-v2 output vectors.
pub const DEFAULT_DIMENSIONS: usize = 384;

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for generating text embeddings.
///
/// Embedders convert text into dense vector representations that capture
/// semantic meaning, enabling similarity search and retrieval.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Get the dimensionality of embeddings produced by this embedder.
    fn dimensions(&self) -> usize;

    /// Get the name of this embedder.
    fn name(&self) -> &str;
}

/// A shared embedder that can be used across threads.
pub type SharedEmbedder = Arc<dyn Embedder>;

// ─────────────────────────────────────────────────────────────────────────────
// Hash Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Deterministic embedder based on feature hashing of lowercase words.
///
/// Texts sharing vocabulary land close together, which is enough for
/// retrieval tests and as an offline fallback when no model is available.
/// Output is unit length unless the text has no words, in which case it is
/// the zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create a new hash embedder with the specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = simple_hash(&word.to_lowercase());
            let slot = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            embedding[slot] += sign;
        }

        normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// djb2 string hash.
fn simple_hash(s: &str) -> u64 {
    let mut hash: u64 = 5381;
    for byte in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    // Spread the low bits into the sign bit.
    hash ^ (hash << 31)
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-9 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for OpenAI embeddings.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Model to use for embeddings.
    pub model: String,
    /// Requested output dimensions (text-embedding-3 models only).
    pub dimensions: Option<usize>,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiEmbedderConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Request a specific output size.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// OpenAI embeddings API client.
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiEmbedderConfig,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let dimensions = config.dimensions.unwrap_or(match config.model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        });

        Ok(Self {
            client,
            config,
            dimensions,
        })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Internal("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input: texts.iter().map(|s| s.to_string()).collect(),
            dimensions: self.config.dimensions,
        };

        let response = self
            .client
            .post(self.embeddings_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => LlmError::Auth(format!("Embedding request rejected: {}", body)),
                429 => LlmError::rate_limit(body),
                _ => LlmError::Backend(format!(
                    "Embedding request failed: HTTP {} - {}",
                    status, body
                )),
            });
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(format!("Failed to parse response: {}", e)))?;

        let mut embeddings = result.data;
        embeddings.sort_by_key(|e| e.index);

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, serde::Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Local Embedder (ONNX Runtime)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "local-embeddings")]
pub mod local {
    //! Local embeddings using ONNX Runtime.
    //!
    //! Requires the `local-embeddings` feature. Expects an exported
    //! sentence-transformers model (`model.onnx`) and its `tokenizer.json`.

    use super::*;
    use ndarray::Array2;
    use ort::session::{Session, builder::GraphOptimizationLevel};
    use ort::value::TensorRef;
    use parking_lot::Mutex;
    use std::path::Path;
    use tokenizers::{Tokenizer, TruncationParams};

    /// Maximum inputs per inference call.
    const CHUNK_SIZE: usize = 32;

    /// Token limit per input; longer texts are cut to their leading tokens.
    /// all-MiniLM-L6-v2 was trained at this length.
    pub const MAX_SEQ_LENGTH: usize = 256;

    /// Local embedder using ONNX Runtime.
    pub struct LocalEmbedder {
        // `Session::run` takes `&mut self`.
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        dimensions: usize,
    }

    impl LocalEmbedder {
        /// Load a local embedder from model files.
        pub fn load(
            model_path: impl AsRef<Path>,
            tokenizer_path: impl AsRef<Path>,
            dimensions: usize,
        ) -> Result<Self> {
            let session = Session::builder()
                .map_err(|e| LlmError::Internal(format!("Failed to create ONNX session: {}", e)))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| {
                    LlmError::Internal(format!("Failed to set optimization level: {}", e))
                })?
                .commit_from_file(model_path.as_ref())
                .map_err(|e| {
                    LlmError::Internal(format!(
                        "Failed to load ONNX model from {:?}: {}",
                        model_path.as_ref(),
                        e
                    ))
                })?;

            let mut tokenizer = Tokenizer::from_file(tokenizer_path.as_ref()).map_err(|e| {
                LlmError::Internal(format!(
                    "Failed to load tokenizer from {:?}: {}",
                    tokenizer_path.as_ref(),
                    e
                ))
            })?;
            limit_sequence_length(&mut tokenizer)?;

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                dimensions,
            })
        }

        /// Run inference on one padded batch and mean-pool over the mask.
        fn run_batch(&self, encodings: &[tokenizers::Encoding]) -> Result<Vec<Vec<f32>>> {
            let batch_size = encodings.len();
            let max_len = encodings
                .iter()
                .map(|e| e.get_ids().len())
                .max()
                .unwrap_or(0);

            let mut input_ids = vec![0i64; batch_size * max_len];
            let mut attention_mask = vec![0i64; batch_size * max_len];
            let mut token_type_ids = vec![0i64; batch_size * max_len];

            for (i, enc) in encodings.iter().enumerate() {
                let offset = i * max_len;
                for (j, ((id, mask), ty)) in enc
                    .get_ids()
                    .iter()
                    .zip(enc.get_attention_mask())
                    .zip(enc.get_type_ids())
                    .enumerate()
                {
                    input_ids[offset + j] = *id as i64;
                    attention_mask[offset + j] = *mask as i64;
                    token_type_ids[offset + j] = *ty as i64;
                }
            }

            let shape = (batch_size, max_len);
            let array_err = |e: ndarray::ShapeError| LlmError::Internal(format!("Array error: {}", e));
            let ids_array = Array2::from_shape_vec(shape, input_ids).map_err(array_err)?;
            let mask_array =
                Array2::from_shape_vec(shape, attention_mask.clone()).map_err(array_err)?;
            let types_array = Array2::from_shape_vec(shape, token_type_ids).map_err(array_err)?;

            let tensor_err = |e: ort::Error| LlmError::Internal(format!("Input error: {}", e));
            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![
                    "input_ids" => TensorRef::from_array_view(ids_array.view()).map_err(tensor_err)?,
                    "attention_mask" => TensorRef::from_array_view(mask_array.view()).map_err(tensor_err)?,
                    "token_type_ids" => TensorRef::from_array_view(types_array.view()).map_err(tensor_err)?,
                ])
                .map_err(|e| LlmError::Internal(format!("ONNX inference failed: {}", e)))?;

            let (out_shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
                LlmError::Internal(format!("Output extraction failed: {}", e))
            })?;

            // (batch_size, seq_len, hidden_dim)
            if out_shape.len() != 3 {
                return Err(LlmError::Internal(format!(
                    "Unexpected output rank {}",
                    out_shape.len()
                )));
            }
            let seq_len = out_shape[1] as usize;
            let hidden_dim = out_shape[2] as usize;

            let mut results = Vec::with_capacity(batch_size);
            for i in 0..batch_size {
                let mask = &attention_mask[i * max_len..(i + 1) * max_len];
                let mut sum = vec![0.0f32; hidden_dim];
                let mut count = 0.0f32;

                for (j, &m) in mask.iter().enumerate().take(seq_len) {
                    if m > 0 {
                        let start = (i * seq_len + j) * hidden_dim;
                        for (k, v) in data[start..start + hidden_dim].iter().enumerate() {
                            sum[k] += v;
                        }
                        count += 1.0;
                    }
                }

                if count > 0.0 {
                    for v in &mut sum {
                        *v /= count;
                    }
                }
                normalize(&mut sum);
                results.push(sum);
            }

            Ok(results)
        }
    }

    /// Truncate every encoding to [`MAX_SEQ_LENGTH`] tokens, special tokens
    /// included.
    fn limit_sequence_length(tokenizer: &mut Tokenizer) -> Result<()> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| LlmError::Internal(format!("Failed to configure truncation: {}", e)))?;
        Ok(())
    }

    #[async_trait]
    impl Embedder for LocalEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let results = self.embed_batch(&[text]).await?;
            results
                .into_iter()
                .next()
                .ok_or_else(|| LlmError::Internal("No embedding returned".to_string()))
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let encodings = texts
                .iter()
                .map(|text| {
                    self.tokenizer
                        .encode(*text, true)
                        .map_err(|e| LlmError::Internal(format!("Tokenization failed: {}", e)))
                })
                .collect::<Result<Vec<_>>>()?;

            let mut all_results = Vec::with_capacity(texts.len());
            for chunk in encodings.chunks(CHUNK_SIZE) {
                all_results.extend(self.run_batch(chunk)?);
            }
            Ok(all_results)
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn name(&self) -> &str {
            "local"
        }
    }

}

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Provider-agnostic description of the embedder to build.
///
/// The binary fills this from the `[embedding]` config section so this crate
/// does not depend on the config crate.
#[derive(Debug, Clone, Default)]
pub struct EmbedderSpec {
    /// Provider name: "local", "openai", or "hash".
    pub provider: String,
    /// OpenAI API key (required for "openai" provider).
    pub openai_api_key: Option<String>,
    /// OpenAI model name.
    pub openai_model: Option<String>,
    /// OpenAI base URL override.
    pub openai_base_url: Option<String>,
    /// Local ONNX model path.
    pub local_model_path: Option<std::path::PathBuf>,
    /// Local tokenizer.json path.
    pub local_tokenizer_path: Option<std::path::PathBuf>,
    /// Requested dimensions.
    pub dimensions: Option<usize>,
}

/// Build a `SharedEmbedder` from a spec.
///
/// Falls back to `HashEmbedder` if the local model is unavailable (feature
/// disabled or model files missing).
pub fn build_embedder(spec: &EmbedderSpec) -> Result<SharedEmbedder> {
    let dims = spec.dimensions.unwrap_or(DEFAULT_DIMENSIONS);

    match spec.provider.as_str() {
        "openai" => {
            let api_key = spec.openai_api_key.as_deref().ok_or_else(|| {
                LlmError::Config(
                    "OpenAI embedding provider requires an API key. \
                     Set OPENAI_API_KEY or configure [llm] api_key."
                        .to_string(),
                )
            })?;
            let mut config = OpenAiEmbedderConfig::new(api_key);
            if let Some(ref model) = spec.openai_model {
                config = config.with_model(model);
            }
            if let Some(ref base_url) = spec.openai_base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(d) = spec.dimensions {
                config = config.with_dimensions(d);
            }
            Ok(Arc::new(OpenAiEmbedder::new(config)?))
        }
        #[cfg(feature = "local-embeddings")]
        "local" => {
            let paths = match (&spec.local_model_path, &spec.local_tokenizer_path) {
                (Some(model), Some(tokenizer)) => Some((model.clone(), tokenizer.clone())),
                _ => default_local_model_dir()
                    .map(|dir| (dir.join("model.onnx"), dir.join("tokenizer.json"))),
            };

            match paths {
                Some((model, tokenizer)) if model.exists() && tokenizer.exists() => {
                    Ok(Arc::new(local::LocalEmbedder::load(&model, &tokenizer, dims)?))
                }
                _ => {
                    tracing::warn!(
                        "Local embedding model not found. Falling back to hash embedder. \
                         Download the all-MiniLM-L6-v2 ONNX model to {:?}",
                        default_local_model_dir()
                    );
                    Ok(Arc::new(HashEmbedder::new(dims)))
                }
            }
        }
        #[cfg(not(feature = "local-embeddings"))]
        "local" => {
            tracing::warn!(
                "Local embeddings requested but 'local-embeddings' feature is not enabled. \
                 Falling back to hash embedder."
            );
            Ok(Arc::new(HashEmbedder::new(dims)))
        }
        "hash" => Ok(Arc::new(HashEmbedder::new(dims))),
        other => Err(LlmError::Config(format!(
            "Unknown embedding provider '{}'. Valid: local, openai, hash",
            other
        ))),
    }
}

/// Default directory for local embedding model files.
pub fn default_local_model_dir() -> Option<std::path::PathBuf> {
    dirs::data_dir().map(|d| d.join("studyhelper").join("models").join("embeddings"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding Function
// ─────────────────────────────────────────────────────────────────────────────

/// Input accepted by [`EmbeddingFunction::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingInput {
    /// One text, producing one vector.
    Single(String),
    /// Several texts, producing one vector each, in order.
    Batch(Vec<String>),
}

impl From<&str> for EmbeddingInput {
    fn from(text: &str) -> Self {
        Self::Single(text.to_string())
    }
}

impl From<Vec<String>> for EmbeddingInput {
    fn from(texts: Vec<String>) -> Self {
        Self::Batch(texts)
    }
}

impl TryFrom<serde_json::Value> for EmbeddingInput {
    type Error = LlmError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        const INVALID: &str = "Input must be a string or a list of strings";

        match value {
            serde_json::Value::String(s) => Ok(Self::Single(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s),
                    _ => Err(LlmError::InvalidRequest(INVALID.to_string())),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Batch),
            _ => Err(LlmError::InvalidRequest(INVALID.to_string())),
        }
    }
}

/// Output of [`EmbeddingFunction::call`], shaped like its input.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutput {
    Single(Vec<f32>),
    Batch(Vec<Vec<f32>>),
}

/// Uniform embedding entry point used for both documents and queries.
///
/// Both [`embed_query`](Self::embed_query) and
/// [`embed_documents`](Self::embed_documents) go through the same embedder,
/// so stored and query vectors share one space.
#[derive(Clone)]
pub struct EmbeddingFunction {
    embedder: SharedEmbedder,
}

impl std::fmt::Debug for EmbeddingFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingFunction")
            .field("embedder", &self.embedder.name())
            .field("dimensions", &self.embedder.dimensions())
            .finish()
    }
}

impl EmbeddingFunction {
    /// Wrap an embedder.
    pub fn new(embedder: SharedEmbedder) -> Self {
        Self { embedder }
    }

    /// Embed a single text or a batch.
    pub async fn call(&self, input: EmbeddingInput) -> Result<EmbeddingOutput> {
        match input {
            EmbeddingInput::Single(text) => {
                Ok(EmbeddingOutput::Single(self.embedder.embed(&text).await?))
            }
            EmbeddingInput::Batch(texts) => {
                let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                Ok(EmbeddingOutput::Batch(self.embedder.embed_batch(&refs).await?))
            }
        }
    }

    /// Embedding for a search query.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder.embed(text).await
    }

    /// Embeddings for documents to be stored.
    pub async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embedder.embed_batch(texts).await
    }

    /// Dimensionality of produced vectors.
    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Name of the underlying embedder.
    pub fn name(&self) -> &str {
        self.embedder.name()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (norm_a * norm_b)
    }

    #[tokio::test]
    async fn test_hash_embedder_shape_and_norm() {
        let embedder = HashEmbedder::default();
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(embedder.name(), "hash");

        let embedding = embedder.embed("hello world").await.unwrap();
        assert_eq!(embedding.len(), 384);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::default();
        let e1 = embedder.embed("test text").await.unwrap();
        let e2 = embedder.embed("test text").await.unwrap();
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn test_hash_embedder_shared_vocabulary_is_closer() {
        let embedder = HashEmbedder::default();
        let base = embedder.embed("cell biology mitosis and meiosis").await.unwrap();
        let related = embedder.embed("Mitosis and meiosis in cell biology").await.unwrap();
        let unrelated = embedder.embed("french revolution causes").await.unwrap();

        assert!(cosine_similarity(&base, &related) > 0.8);
        assert!(cosine_similarity(&base, &related) > cosine_similarity(&base, &unrelated));
    }

    #[tokio::test]
    async fn test_hash_embedder_empty_text_is_zero() {
        let embedder = HashEmbedder::new(8);
        let embedding = embedder.embed("").await.unwrap();
        assert_eq!(embedding, vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_embed_batch_default() {
        let embedder = HashEmbedder::default();
        let embeddings = embedder.embed_batch(&["one", "two", "three"]).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert!(embeddings.iter().all(|e| e.len() == 384));
    }

    #[test]
    fn test_openai_embedder_config_builder() {
        let config = OpenAiEmbedderConfig::new("key")
            .with_base_url("http://custom.api")
            .with_model("text-embedding-3-large");
        assert_eq!(config.base_url, "http://custom.api");

        let embedder = OpenAiEmbedder::new(config).unwrap();
        assert_eq!(embedder.dimensions(), 3072);
        assert_eq!(embedder.embeddings_url(), "http://custom.api/embeddings");
    }

    #[test]
    fn test_build_embedder_hash_and_fallback() {
        let hash = build_embedder(&EmbedderSpec {
            provider: "hash".to_string(),
            dimensions: Some(16),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(hash.name(), "hash");
        assert_eq!(hash.dimensions(), 16);

        // Missing model files degrade "local" to hashing.
        let local = build_embedder(&EmbedderSpec {
            provider: "local".to_string(),
            local_model_path: Some("/nonexistent/model.onnx".into()),
            local_tokenizer_path: Some("/nonexistent/tokenizer.json".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(local.name(), "hash");
        assert_eq!(local.dimensions(), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn test_build_embedder_errors() {
        let missing_key = build_embedder(&EmbedderSpec {
            provider: "openai".to_string(),
            ..Default::default()
        });
        assert!(matches!(missing_key, Err(LlmError::Config(_))));

        let unknown = build_embedder(&EmbedderSpec {
            provider: "word2vec".to_string(),
            ..Default::default()
        });
        assert!(matches!(unknown, Err(LlmError::Config(_))));
    }

    #[test]
    fn test_embedding_input_from_json() {
        let single = EmbeddingInput::try_from(serde_json::json!("text")).unwrap();
        assert_eq!(single, EmbeddingInput::Single("text".to_string()));

        let batch = EmbeddingInput::try_from(serde_json::json!(["a", "b"])).unwrap();
        assert_eq!(
            batch,
            EmbeddingInput::Batch(vec!["a".to_string(), "b".to_string()])
        );

        for bad in [
            serde_json::json!(42),
            serde_json::json!({"text": "x"}),
            serde_json::json!(["a", 1]),
        ] {
            let err = EmbeddingInput::try_from(bad).unwrap_err();
            assert!(err.to_string().contains("Input must be a string or a list of strings"));
        }
    }

    #[tokio::test]
    async fn test_embedding_function_shapes_follow_input() {
        let function = EmbeddingFunction::new(Arc::new(HashEmbedder::new(8)));

        match function.call("one".into()).await.unwrap() {
            EmbeddingOutput::Single(v) => assert_eq!(v.len(), 8),
            other => panic!("expected single, got {other:?}"),
        }

        match function
            .call(vec!["a".to_string(), "b".to_string()].into())
            .await
            .unwrap()
        {
            EmbeddingOutput::Batch(vs) => assert_eq!(vs.len(), 2),
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_and_document_share_space() {
        let function = EmbeddingFunction::new(Arc::new(HashEmbedder::default()));
        let query = function.embed_query("photosynthesis").await.unwrap();
        let docs = function.embed_documents(&["photosynthesis"]).await.unwrap();
        assert_eq!(query, docs[0]);
    }
}
