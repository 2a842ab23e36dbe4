//! Core traits for plenum abstractions.
//!
//! The repository traits define the contract the external storage
//! collaborator must satisfy; the inference traits define pluggable
//! embedding and chat-completion backends. Both exist so the discourse core
//! stays testable against in-memory and mock implementations.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CONVERSATION REPOSITORY
// =============================================================================

/// Repository for conversation rows.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Create a conversation. Voting starts disabled.
    async fn create_conversation(&self, name: &str) -> Result<Conversation>;

    /// Fetch a conversation by id.
    async fn get_conversation(&self, id: Uuid) -> Result<Conversation>;

    /// List all conversations, newest first.
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// Enable or disable persona voting for a conversation.
    async fn set_voting(&self, id: Uuid, enabled: bool) -> Result<()>;

    /// Delete a conversation, cascading to its documents, chunks, turns,
    /// speaking order, and votes.
    async fn delete_conversation(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// DOCUMENT & CHUNK REPOSITORIES
// =============================================================================

/// Repository for document rows.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document under a conversation.
    async fn create_document(&self, req: NewDocument) -> Result<Document>;

    /// Fetch a document by id.
    async fn get_document(&self, id: Uuid) -> Result<Document>;

    /// List a conversation's documents in insertion order.
    async fn list_documents(&self, conversation_id: Uuid) -> Result<Vec<Document>>;

    /// Delete a document, cascading to its chunks.
    async fn delete_document(&self, id: Uuid) -> Result<()>;
}

/// Repository for chunk rows.
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Insert all chunks for a document in one operation. Sequence numbers
    /// must be 1-based and gap-free; violations are a validation error.
    async fn insert_chunks(&self, chunks: Vec<NewChunk>) -> Result<Vec<Chunk>>;

    /// Attach an embedding to a chunk. A chunk's embedding is write-once;
    /// attaching to an already-embedded chunk is a validation error.
    async fn attach_embedding(&self, chunk_id: Uuid, embedding: Vector) -> Result<()>;

    /// List a document's chunks ordered by sequence number.
    async fn list_chunks_for_document(&self, document_id: Uuid) -> Result<Vec<Chunk>>;

    /// List every chunk across all documents of a conversation.
    async fn list_chunks_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Chunk>>;
}

// =============================================================================
// PERSONA REPOSITORY
// =============================================================================

/// Repository for persona configurations.
#[async_trait]
pub trait PersonaRepository: Send + Sync {
    /// Insert a new persona configuration.
    async fn create_persona(&self, req: NewPersona) -> Result<PersonaConfig>;

    /// Fetch a persona by id.
    async fn get_persona(&self, id: Uuid) -> Result<PersonaConfig>;

    /// List all personas, active or not.
    async fn list_personas(&self) -> Result<Vec<PersonaConfig>>;

    /// List personas eligible for selection.
    async fn list_active_personas(&self) -> Result<Vec<PersonaConfig>>;

    /// Activate or deactivate a persona. Deactivation hides it from future
    /// selection without deleting its history.
    async fn set_persona_active(&self, id: Uuid, active: bool) -> Result<()>;
}

// =============================================================================
// TURN REPOSITORY
// =============================================================================

/// Repository for turn rows.
#[async_trait]
pub trait TurnRepository: Send + Sync {
    /// Append a turn. The store serializes turn-number assignment per
    /// conversation: `req.turn_number` must be exactly one past the last
    /// persisted turn number, otherwise the append fails with a validation
    /// error and nothing is written.
    async fn append_turn(&self, req: NewTurn) -> Result<Turn>;

    /// Last assigned turn number for a conversation; 0 when it has no turns.
    async fn last_turn_number(&self, conversation_id: Uuid) -> Result<i32>;

    /// Fetch a turn by id.
    async fn get_turn(&self, id: Uuid) -> Result<Turn>;

    /// List a conversation's turns ordered by turn number.
    async fn list_turns(&self, conversation_id: Uuid) -> Result<Vec<Turn>>;

    /// List turns strictly before the given turn number, ordered.
    async fn list_turns_before(
        &self,
        conversation_id: Uuid,
        turn_number: i32,
    ) -> Result<Vec<Turn>>;
}

// =============================================================================
// SPEAKING ORDER & VOTE REPOSITORIES
// =============================================================================

/// Repository for the per-conversation rotation order.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Append a rotation slot. A duplicate position within the conversation
    /// is a validation error.
    async fn append_order(&self, req: NewPersonaOrder) -> Result<PersonaOrder>;

    /// List a conversation's rotation slots ordered by position.
    async fn list_order(&self, conversation_id: Uuid) -> Result<Vec<PersonaOrder>>;

    /// Remove one rotation slot by id.
    async fn remove_order(&self, id: Uuid) -> Result<()>;

    /// Replace a conversation's entire rotation order. Every referenced
    /// persona must exist; the previous order is discarded atomically.
    async fn replace_order(
        &self,
        conversation_id: Uuid,
        entries: Vec<NewPersonaOrder>,
    ) -> Result<Vec<PersonaOrder>>;
}

/// Repository for next-speaker votes.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Cast or revise a vote. At most one row exists per (turn, voter);
    /// casting again before the next turn updates the nominee.
    async fn upsert_vote(&self, req: NewVote) -> Result<PersonaVote>;

    /// List all votes cast for a turn.
    async fn list_votes(&self, turn_id: Uuid) -> Result<Vec<PersonaVote>>;

    /// Withdraw a voter's vote for a turn.
    async fn remove_vote(&self, turn_id: Uuid, voter_id: Uuid) -> Result<()>;
}

/// The full storage collaborator contract consumed by the discourse engine.
pub trait DiscourseStore:
    ConversationRepository
    + DocumentRepository
    + ChunkRepository
    + PersonaRepository
    + TurnRepository
    + OrderRepository
    + VoteRepository
{
}

impl<T> DiscourseStore for T where
    T: ConversationRepository
        + DocumentRepository
        + ChunkRepository
        + PersonaRepository
        + TurnRepository
        + OrderRepository
        + VoteRepository
{
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate an embedding for one text.
    async fn embed(&self, text: &str) -> Result<Vector>;

    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

/// A fully assembled chat-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Backend model identifier.
    pub model: String,
    pub system_prompt: String,
    pub user_content: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    /// Provider-specific extra parameters, merged opaquely into the request
    /// body where the wire format allows it.
    pub extra_params: Option<JsonValue>,
}

/// Backend for chat completions.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run a completion and return the raw completion text.
    async fn complete(&self, req: &CompletionRequest) -> Result<String>;

    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;

    /// Provider identifier this backend serves, e.g. "openai".
    fn provider_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingBackend for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vector> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_embed_batch_default_impl() {
        let backend = FixedEmbedder;
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let vectors = backend.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 2));
    }

    #[test]
    fn test_completion_request_clone() {
        let req = CompletionRequest {
            model: "gpt-4o".to_string(),
            system_prompt: "system".to_string(),
            user_content: "user".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            top_p: 1.0,
            extra_params: Some(serde_json::json!({"seed": 7})),
        };
        let cloned = req.clone();
        assert_eq!(cloned.model, "gpt-4o");
        assert_eq!(cloned.extra_params, req.extra_params);
    }
}
