//! Top-K chunk retrieval over a conversation's documents.
//!
//! Ranks embedded chunks by ascending cosine distance to the query
//! embedding. Ties break by chunk id ascending so results are
//! deterministic. Chunks without a computed embedding are excluded rather
//! than treated as an error, and a conversation with no documents yields an
//! empty result.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use plenum_core::{defaults, Chunk, ChunkRepository, EmbeddingBackend, Result};

use crate::multi_query::{default_templates, reformulate};
use crate::similarity::cosine_distance;

/// Configuration for the retrieval engine.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Top-K result budget.
    pub limit: usize,
    /// Reformulation templates for multi-query retrieval. Each template
    /// receives the base query via the `{query}` placeholder.
    pub templates: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: defaults::RETRIEVAL_LIMIT,
            templates: default_templates(),
        }
    }
}

/// Similarity retrieval over a conversation's chunk corpus.
pub struct RetrievalEngine {
    chunks: Arc<dyn ChunkRepository>,
    embedder: Arc<dyn EmbeddingBackend>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    /// Create a retrieval engine over the given chunk store and embedder.
    pub fn new(
        chunks: Arc<dyn ChunkRepository>,
        embedder: Arc<dyn EmbeddingBackend>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            chunks,
            embedder,
            config,
        }
    }

    /// Get the configuration used by this engine.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve the top-`limit` chunks for a single query.
    pub async fn retrieve(
        &self,
        query: &str,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Chunk>> {
        let candidates: Vec<Chunk> = self
            .chunks
            .list_chunks_for_conversation(conversation_id)
            .await?
            .into_iter()
            .filter(Chunk::has_embedding)
            .collect();

        if candidates.is_empty() {
            debug!(
                conversation_id = %conversation_id,
                "No embedded chunks available for retrieval"
            );
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(f32, Chunk)> = candidates
            .into_iter()
            .map(|chunk| {
                let distance = chunk
                    .embedding
                    .as_deref()
                    .map(|e| cosine_distance(&query_embedding, e))
                    .unwrap_or(f32::MAX);
                (distance, chunk)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.id.cmp(&b.1.id))
        });
        scored.truncate(limit);

        debug!(
            conversation_id = %conversation_id,
            result_count = scored.len(),
            "Single-query retrieval complete"
        );
        Ok(scored.into_iter().map(|(_, chunk)| chunk).collect())
    }

    /// Retrieve up to the configured K chunks using multi-query expansion.
    ///
    /// Each reformulated query receives an even share of the K budget;
    /// results are deduplicated by chunk id in first-seen order and topped
    /// up from the unreformulated base query until K is reached or
    /// candidates exhaust.
    pub async fn retrieve_multi(&self, query: &str, conversation_id: Uuid) -> Result<Vec<Chunk>> {
        let limit = self.config.limit;
        let queries = reformulate(query, &self.config.templates);
        let share = (limit / queries.len().max(1)).max(1);

        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut results: Vec<Chunk> = Vec::new();

        for reformulated in &queries {
            let hits = self.retrieve(reformulated, conversation_id, share).await?;
            for chunk in hits {
                if results.len() >= limit {
                    break;
                }
                if seen.insert(chunk.id) {
                    results.push(chunk);
                }
            }
        }

        if results.len() < limit {
            let top_up = self.retrieve(query, conversation_id, limit).await?;
            for chunk in top_up {
                if results.len() >= limit {
                    break;
                }
                if seen.insert(chunk.id) {
                    results.push(chunk);
                }
            }
        }

        debug!(
            conversation_id = %conversation_id,
            result_count = results.len(),
            query_count = queries.len(),
            "Multi-query retrieval complete"
        );
        Ok(results)
    }
}
