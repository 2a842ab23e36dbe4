//! Embedding backends.
//!
//! Two implementations of [`EmbeddingBackend`]: an OpenAI-style HTTP client
//! and a seeded deterministic fallback for offline development and tests.
//! The fallback hashes the input text into an RNG seed, so identical text
//! always yields an identical vector while different texts diverge with
//! overwhelming probability. Fallback vectors carry no semantic meaning.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use plenum_core::{defaults, EmbeddingBackend, Error, Result, Vector};

// =============================================================================
// SEEDED FALLBACK
// =============================================================================

/// Deterministic hash-seeded embedding generator.
///
/// Used when no external embedding backend is configured. Must never be
/// mistaken for a semantic model: retrieval over these vectors is stable
/// and testable but meaningless.
#[derive(Debug, Clone)]
pub struct SeededEmbedding {
    dimension: usize,
}

impl SeededEmbedding {
    /// Create a fallback generator with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Generate the deterministic vector for `text`.
    pub fn generate(&self, text: &str) -> Vector {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);
        let seed = u64::from_le_bytes(seed_bytes);

        let mut rng = StdRng::seed_from_u64(seed);
        (0..self.dimension)
            .map(|_| rng.gen_range(-1.0f32..1.0f32))
            .collect()
    }
}

impl Default for SeededEmbedding {
    fn default() -> Self {
        Self::new(defaults::EMBED_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingBackend for SeededEmbedding {
    async fn embed(&self, text: &str) -> Result<Vector> {
        Ok(self.generate(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "seeded-fallback"
    }
}

// =============================================================================
// OPENAI-STYLE HTTP BACKEND
// =============================================================================

/// Configuration for the OpenAI-style embedding backend.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub model: String,
    /// Expected embedding dimension.
    pub dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            model: defaults::EMBED_MODEL.to_string(),
            dimension: defaults::EMBED_DIMENSION,
            timeout_seconds: defaults::EMBED_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// OpenAI-style `/embeddings` backend.
pub struct OpenAIEmbedding {
    client: Client,
    config: EmbeddingConfig,
}

impl OpenAIEmbedding {
    /// Create a new embedding backend with the given configuration.
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing embedding backend: url={}, model={}, dim={}",
            config.base_url, config.model, config.dimension
        );
        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIEmbedding {
    async fn embed(&self, text: &str) -> Result<Vector> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("Backend returned no embeddings".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            "Embedding {} texts with model {}",
            texts.len(),
            self.config.model
        );

        let url = format!(
            "{}/embeddings",
            self.config.base_url.trim_end_matches('/')
        );
        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: self.config.model.clone(),
            input: texts.to_vec(),
            encoding_format: "float",
        });
        if let Some(ref api_key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Embedding backend returned {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        let vectors: Vec<Vector> = data.into_iter().map(|d| d.embedding).collect();
        for vector in &vectors {
            if vector.len() != self.config.dimension {
                return Err(Error::Embedding(format!(
                    "Backend returned dimension {}, expected {}",
                    vector.len(),
                    self.config.dimension
                )));
            }
        }

        debug!("Generated {} embeddings", vectors.len());
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Build the deployment's embedding backend from environment variables.
///
/// With `OPENAI_API_KEY` set, embeddings go through the OpenAI-style
/// backend; otherwise the deterministic fallback is used and a warning is
/// logged. `EMBED_MODEL` and `EMBED_DIMENSION` override the defaults.
pub fn embedding_backend_from_env() -> Result<Arc<dyn EmbeddingBackend>> {
    dotenvy::dotenv().ok();

    let dimension = std::env::var("EMBED_DIMENSION")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults::EMBED_DIMENSION);

    match std::env::var("OPENAI_API_KEY") {
        Ok(api_key) if !api_key.is_empty() => {
            let config = EmbeddingConfig {
                base_url: std::env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| defaults::OPENAI_URL.to_string()),
                api_key: Some(api_key),
                model: std::env::var("EMBED_MODEL")
                    .unwrap_or_else(|_| defaults::EMBED_MODEL.to_string()),
                dimension,
                timeout_seconds: defaults::EMBED_TIMEOUT_SECS,
            };
            Ok(Arc::new(OpenAIEmbedding::new(config)?))
        }
        _ => {
            warn!(
                dimension,
                "No embedding credentials configured; using deterministic fallback vectors"
            );
            Ok(Arc::new(SeededEmbedding::new(dimension)))
        }
    }
}
