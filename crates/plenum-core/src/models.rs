//! Core data models for plenum.
//!
//! These types are shared across all plenum crates and represent the
//! persisted discourse entities: conversations, documents, chunks, persona
//! configurations, turns, speaking orders, and next-speaker votes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults;

/// Embedding vector. Dimension is fixed per deployment by the active
/// embedding backend (see [`defaults::EMBED_DIMENSION`]).
pub type Vector = Vec<f32>;

// =============================================================================
// CONVERSATION TYPES
// =============================================================================

/// A discourse session. Owns its documents, turns, speaking order, and votes;
/// deleting a conversation cascades to all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub name: String,
    /// When true, next-speaker resolution considers persona votes.
    pub enable_voting: bool,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// A raw source document uploaded into a conversation.
/// Immutable once chunked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub filename: String,
    pub content: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Request for creating a new document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub conversation_id: Uuid,
    pub filename: String,
    pub content: String,
}

/// A retrievable unit of document text with structural metadata and an
/// optional embedding. Sequence numbers are 1-based and gap-free per
/// document; the embedding is absent until the embedding backend has run,
/// after which it is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub sequence_number: i32,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    pub is_section_header: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_group: Option<String>,
    /// Importance in [0, 1]; section headers are always 1.0.
    pub importance_score: f32,
    pub created_at_utc: DateTime<Utc>,
}

impl Chunk {
    /// Whether this chunk can participate in similarity retrieval.
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Request for inserting a new, not-yet-embedded chunk.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub document_id: Uuid,
    pub sequence_number: i32,
    pub content: String,
    pub section_title: Option<String>,
    pub is_section_header: bool,
    pub paragraph_id: Option<i32>,
    pub semantic_group: Option<String>,
    pub importance_score: f32,
}

// =============================================================================
// PERSONA TYPES
// =============================================================================

/// A configured model identity a turn can speak as. Created by
/// configuration, never mutated mid-turn; deactivation hides a persona from
/// future selection without deleting its history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub id: Uuid,
    /// Configuration label, e.g. "gpt4-skeptic".
    pub name: String,
    /// Provider identifier, e.g. "openai", "anthropic", "deepseek".
    pub provider: String,
    /// Backend model identifier, e.g. "gpt-4o", "claude-sonnet-4-5".
    pub model_id: String,
    pub persona_name: String,
    pub persona_description: String,
    pub persona_instructions: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    /// Provider-specific extra parameters, passed through opaquely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_parameters: Option<JsonValue>,
    pub is_active: bool,
    pub created_at_utc: DateTime<Utc>,
}

/// Request for creating a new persona configuration.
#[derive(Debug, Clone)]
pub struct NewPersona {
    pub name: String,
    pub provider: String,
    pub model_id: String,
    pub persona_name: String,
    pub persona_description: String,
    pub persona_instructions: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub provider_parameters: Option<JsonValue>,
    pub is_active: bool,
}

impl Default for NewPersona {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: String::new(),
            model_id: String::new(),
            persona_name: String::new(),
            persona_description: String::new(),
            persona_instructions: String::new(),
            temperature: defaults::TEMPERATURE,
            max_tokens: defaults::MAX_TOKENS,
            top_p: defaults::TOP_P,
            provider_parameters: None,
            is_active: true,
        }
    }
}

// =============================================================================
// TURN TYPES
// =============================================================================

/// One persona's contribution at a given position in a conversation.
/// Immutable once created. Turn numbers are 1-based, strictly increasing,
/// and gap-free within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub turn_number: i32,
    /// Persona that spoke. `None` for legacy rows predating personas.
    pub persona_id: Option<Uuid>,
    /// Public-track response text.
    pub response: String,
    /// Private-track reasoning. `None` for legacy rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_thoughts: Option<String>,
    /// Explicit next-speaker override attached to this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_override_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
}

/// Request for appending a new turn.
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub conversation_id: Uuid,
    pub turn_number: i32,
    pub persona_id: Option<Uuid>,
    pub response: String,
    pub private_thoughts: Option<String>,
    pub next_override_id: Option<Uuid>,
}

// =============================================================================
// SPEAKING ORDER TYPES
// =============================================================================

/// One slot in a conversation's fixed rotation order. Positions are 0-based
/// and unique per conversation; the same persona may occupy several slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaOrder {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub persona_id: Uuid,
    pub position: i32,
    pub created_at_utc: DateTime<Utc>,
}

/// Request for appending a rotation slot.
#[derive(Debug, Clone)]
pub struct NewPersonaOrder {
    pub conversation_id: Uuid,
    pub persona_id: Uuid,
    pub position: i32,
}

// =============================================================================
// VOTE TYPES
// =============================================================================

/// One persona's nomination for who should speak after a given turn.
/// At most one row per (turn, voter); revising before the next turn is an
/// upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaVote {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub turn_id: Uuid,
    pub voter_id: Uuid,
    pub nominee_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
}

/// Request for casting (or revising) a vote.
#[derive(Debug, Clone)]
pub struct NewVote {
    pub conversation_id: Uuid,
    pub turn_id: Uuid,
    pub voter_id: Uuid,
    pub nominee_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk() -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            sequence_number: 1,
            content: "The committee convened in Geneva.".to_string(),
            embedding: None,
            section_title: Some("Introduction".to_string()),
            is_section_header: false,
            paragraph_id: Some(1),
            semantic_group: Some("Topic: Geneva".to_string()),
            importance_score: 0.75,
            created_at_utc: Utc::now(),
        }
    }

    #[test]
    fn test_chunk_has_embedding() {
        let mut chunk = sample_chunk();
        assert!(!chunk.has_embedding());
        chunk.embedding = Some(vec![0.0; 4]);
        assert!(chunk.has_embedding());
    }

    #[test]
    fn test_chunk_serialization_skips_absent_embedding() {
        let chunk = sample_chunk();
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(!json.contains("\"embedding\""));

        let parsed: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sequence_number, 1);
        assert_eq!(parsed.semantic_group.as_deref(), Some("Topic: Geneva"));
    }

    #[test]
    fn test_new_persona_defaults() {
        let req = NewPersona::default();
        assert_eq!(req.temperature, defaults::TEMPERATURE);
        assert_eq!(req.max_tokens, defaults::MAX_TOKENS);
        assert_eq!(req.top_p, defaults::TOP_P);
        assert!(req.is_active);
    }

    #[test]
    fn test_turn_roundtrip() {
        let turn = Turn {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            turn_number: 3,
            persona_id: Some(Uuid::new_v4()),
            response: "I disagree with the premise.".to_string(),
            private_thoughts: Some("The prior turn overstated the evidence.".to_string()),
            next_override_id: None,
            created_at_utc: Utc::now(),
        };

        let json = serde_json::to_string(&turn).unwrap();
        let parsed: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.turn_number, 3);
        assert_eq!(parsed.response, turn.response);
        assert_eq!(parsed.private_thoughts, turn.private_thoughts);
    }
}
