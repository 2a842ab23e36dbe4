//! In-memory storage collaborator.
//!
//! A single `RwLock` guards all tables, which gives every operation the
//! transaction guarantee the contract requires without per-table locking.
//! In particular, `append_turn` holds the write lock across its
//! read-last-then-increment check, serializing turn-number assignment per
//! conversation under concurrent turn requests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use plenum_core::{
    Chunk, Conversation, ConversationRepository, ChunkRepository, Document, DocumentRepository,
    Error, NewChunk, NewDocument, NewPersona, NewPersonaOrder, NewTurn, NewVote, OrderRepository,
    PersonaConfig, PersonaOrder, PersonaRepository, PersonaVote, Result, Turn, TurnRepository,
    Vector, VoteRepository,
};

#[derive(Default)]
struct State {
    conversations: HashMap<Uuid, Conversation>,
    documents: HashMap<Uuid, Document>,
    chunks: HashMap<Uuid, Chunk>,
    personas: HashMap<Uuid, PersonaConfig>,
    turns: HashMap<Uuid, Turn>,
    orders: HashMap<Uuid, PersonaOrder>,
    votes: HashMap<Uuid, PersonaVote>,
}

/// In-memory implementation of every plenum repository trait.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn conversation(&self, id: Uuid) -> Result<&Conversation> {
        self.conversations
            .get(&id)
            .ok_or(Error::ConversationNotFound(id))
    }

    fn persona(&self, id: Uuid) -> Result<&PersonaConfig> {
        self.personas.get(&id).ok_or(Error::PersonaNotFound(id))
    }

    fn document_ids_for(&self, conversation_id: Uuid) -> Vec<Uuid> {
        self.documents
            .values()
            .filter(|d| d.conversation_id == conversation_id)
            .map(|d| d.id)
            .collect()
    }

    fn remove_document_cascade(&mut self, document_id: Uuid) {
        self.chunks.retain(|_, c| c.document_id != document_id);
        self.documents.remove(&document_id);
    }
}

// =============================================================================
// CONVERSATIONS
// =============================================================================

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn create_conversation(&self, name: &str) -> Result<Conversation> {
        if name.trim().is_empty() {
            return Err(Error::Validation(
                "conversation name must not be empty".to_string(),
            ));
        }
        let conversation = Conversation {
            id: Uuid::new_v4(),
            name: name.to_string(),
            enable_voting: false,
            created_at_utc: Utc::now(),
        };
        let mut state = self.state.write().await;
        state
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Conversation> {
        let state = self.state.read().await;
        state.conversation(id).cloned()
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let state = self.state.read().await;
        let mut out: Vec<Conversation> = state.conversations.values().cloned().collect();
        out.sort_by(|a, b| {
            b.created_at_utc
                .cmp(&a.created_at_utc)
                .then(a.id.cmp(&b.id))
        });
        Ok(out)
    }

    async fn set_voting(&self, id: Uuid, enabled: bool) -> Result<()> {
        let mut state = self.state.write().await;
        state.conversation(id)?;
        if let Some(conversation) = state.conversations.get_mut(&id) {
            conversation.enable_voting = enabled;
        }
        Ok(())
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        state.conversation(id)?;
        for document_id in state.document_ids_for(id) {
            state.remove_document_cascade(document_id);
        }
        state.turns.retain(|_, t| t.conversation_id != id);
        state.orders.retain(|_, o| o.conversation_id != id);
        state.votes.retain(|_, v| v.conversation_id != id);
        state.conversations.remove(&id);
        debug!(conversation_id = %id, "Deleted conversation with cascade");
        Ok(())
    }
}

// =============================================================================
// DOCUMENTS & CHUNKS
// =============================================================================

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn create_document(&self, req: NewDocument) -> Result<Document> {
        let mut state = self.state.write().await;
        state.conversation(req.conversation_id)?;
        let document = Document {
            id: Uuid::new_v4(),
            conversation_id: req.conversation_id,
            filename: req.filename,
            content: req.content,
            created_at_utc: Utc::now(),
        };
        state.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Document> {
        let state = self.state.read().await;
        state.documents.get(&id).cloned().ok_or(Error::DocumentNotFound(id))
    }

    async fn list_documents(&self, conversation_id: Uuid) -> Result<Vec<Document>> {
        let state = self.state.read().await;
        state.conversation(conversation_id)?;
        let mut out: Vec<Document> = state
            .documents
            .values()
            .filter(|d| d.conversation_id == conversation_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.created_at_utc
                .cmp(&b.created_at_utc)
                .then(a.id.cmp(&b.id))
        });
        Ok(out)
    }

    async fn delete_document(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.documents.contains_key(&id) {
            return Err(Error::DocumentNotFound(id));
        }
        state.remove_document_cascade(id);
        Ok(())
    }
}

#[async_trait]
impl ChunkRepository for MemoryStore {
    async fn insert_chunks(&self, chunks: Vec<NewChunk>) -> Result<Vec<Chunk>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let mut state = self.state.write().await;

        let document_id = chunks[0].document_id;
        if chunks.iter().any(|c| c.document_id != document_id) {
            return Err(Error::Validation(
                "insert_chunks requires all chunks to share one document".to_string(),
            ));
        }
        if !state.documents.contains_key(&document_id) {
            return Err(Error::DocumentNotFound(document_id));
        }

        let existing_max = state
            .chunks
            .values()
            .filter(|c| c.document_id == document_id)
            .map(|c| c.sequence_number)
            .max()
            .unwrap_or(0);
        for (offset, chunk) in chunks.iter().enumerate() {
            let expected = existing_max + 1 + offset as i32;
            if chunk.sequence_number != expected {
                return Err(Error::Validation(format!(
                    "chunk sequence numbers must be gap-free: expected {}, got {}",
                    expected, chunk.sequence_number
                )));
            }
        }

        let mut inserted = Vec::with_capacity(chunks.len());
        for req in chunks {
            let chunk = Chunk {
                id: Uuid::new_v4(),
                document_id: req.document_id,
                sequence_number: req.sequence_number,
                content: req.content,
                embedding: None,
                section_title: req.section_title,
                is_section_header: req.is_section_header,
                paragraph_id: req.paragraph_id,
                semantic_group: req.semantic_group,
                importance_score: req.importance_score,
                created_at_utc: Utc::now(),
            };
            state.chunks.insert(chunk.id, chunk.clone());
            inserted.push(chunk);
        }
        debug!(
            document_id = %document_id,
            chunk_count = inserted.len(),
            "Inserted chunk batch"
        );
        Ok(inserted)
    }

    async fn attach_embedding(&self, chunk_id: Uuid, embedding: Vector) -> Result<()> {
        let mut state = self.state.write().await;
        let chunk = state
            .chunks
            .get_mut(&chunk_id)
            .ok_or_else(|| Error::NotFound(format!("chunk {}", chunk_id)))?;
        if chunk.embedding.is_some() {
            return Err(Error::Validation(format!(
                "chunk {} already has an embedding",
                chunk_id
            )));
        }
        chunk.embedding = Some(embedding);
        Ok(())
    }

    async fn list_chunks_for_document(&self, document_id: Uuid) -> Result<Vec<Chunk>> {
        let state = self.state.read().await;
        if !state.documents.contains_key(&document_id) {
            return Err(Error::DocumentNotFound(document_id));
        }
        let mut out: Vec<Chunk> = state
            .chunks
            .values()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect();
        out.sort_by_key(|c| c.sequence_number);
        Ok(out)
    }

    async fn list_chunks_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Chunk>> {
        let state = self.state.read().await;
        state.conversation(conversation_id)?;
        let document_ids = state.document_ids_for(conversation_id);
        let mut out: Vec<Chunk> = state
            .chunks
            .values()
            .filter(|c| document_ids.contains(&c.document_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then(a.sequence_number.cmp(&b.sequence_number))
        });
        Ok(out)
    }
}

// =============================================================================
// PERSONAS
// =============================================================================

#[async_trait]
impl PersonaRepository for MemoryStore {
    async fn create_persona(&self, req: NewPersona) -> Result<PersonaConfig> {
        if req.name.trim().is_empty() || req.persona_name.trim().is_empty() {
            return Err(Error::Validation(
                "persona name fields must not be empty".to_string(),
            ));
        }
        let persona = PersonaConfig {
            id: Uuid::new_v4(),
            name: req.name,
            provider: req.provider,
            model_id: req.model_id,
            persona_name: req.persona_name,
            persona_description: req.persona_description,
            persona_instructions: req.persona_instructions,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            top_p: req.top_p,
            provider_parameters: req.provider_parameters,
            is_active: req.is_active,
            created_at_utc: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.personas.insert(persona.id, persona.clone());
        Ok(persona)
    }

    async fn get_persona(&self, id: Uuid) -> Result<PersonaConfig> {
        let state = self.state.read().await;
        state.persona(id).cloned()
    }

    async fn list_personas(&self) -> Result<Vec<PersonaConfig>> {
        let state = self.state.read().await;
        let mut out: Vec<PersonaConfig> = state.personas.values().cloned().collect();
        out.sort_by(|a, b| {
            a.created_at_utc
                .cmp(&b.created_at_utc)
                .then(a.id.cmp(&b.id))
        });
        Ok(out)
    }

    async fn list_active_personas(&self) -> Result<Vec<PersonaConfig>> {
        Ok(self
            .list_personas()
            .await?
            .into_iter()
            .filter(|p| p.is_active)
            .collect())
    }

    async fn set_persona_active(&self, id: Uuid, active: bool) -> Result<()> {
        let mut state = self.state.write().await;
        state.persona(id)?;
        if let Some(persona) = state.personas.get_mut(&id) {
            persona.is_active = active;
        }
        Ok(())
    }
}

// =============================================================================
// TURNS
// =============================================================================

#[async_trait]
impl TurnRepository for MemoryStore {
    async fn append_turn(&self, req: NewTurn) -> Result<Turn> {
        let mut state = self.state.write().await;
        state.conversation(req.conversation_id)?;
        if let Some(persona_id) = req.persona_id {
            state.persona(persona_id)?;
        }
        if let Some(override_id) = req.next_override_id {
            state.persona(override_id)?;
        }

        let last = state
            .turns
            .values()
            .filter(|t| t.conversation_id == req.conversation_id)
            .map(|t| t.turn_number)
            .max()
            .unwrap_or(0);
        if req.turn_number != last + 1 {
            return Err(Error::Validation(format!(
                "turn number {} is stale: next turn for conversation {} is {}",
                req.turn_number,
                req.conversation_id,
                last + 1
            )));
        }

        let turn = Turn {
            id: Uuid::new_v4(),
            conversation_id: req.conversation_id,
            turn_number: req.turn_number,
            persona_id: req.persona_id,
            response: req.response,
            private_thoughts: req.private_thoughts,
            next_override_id: req.next_override_id,
            created_at_utc: Utc::now(),
        };
        state.turns.insert(turn.id, turn.clone());
        Ok(turn)
    }

    async fn last_turn_number(&self, conversation_id: Uuid) -> Result<i32> {
        let state = self.state.read().await;
        state.conversation(conversation_id)?;
        Ok(state
            .turns
            .values()
            .filter(|t| t.conversation_id == conversation_id)
            .map(|t| t.turn_number)
            .max()
            .unwrap_or(0))
    }

    async fn get_turn(&self, id: Uuid) -> Result<Turn> {
        let state = self.state.read().await;
        state.turns.get(&id).cloned().ok_or(Error::TurnNotFound(id))
    }

    async fn list_turns(&self, conversation_id: Uuid) -> Result<Vec<Turn>> {
        let state = self.state.read().await;
        state.conversation(conversation_id)?;
        let mut out: Vec<Turn> = state
            .turns
            .values()
            .filter(|t| t.conversation_id == conversation_id)
            .cloned()
            .collect();
        out.sort_by_key(|t| t.turn_number);
        Ok(out)
    }

    async fn list_turns_before(
        &self,
        conversation_id: Uuid,
        turn_number: i32,
    ) -> Result<Vec<Turn>> {
        Ok(self
            .list_turns(conversation_id)
            .await?
            .into_iter()
            .filter(|t| t.turn_number < turn_number)
            .collect())
    }
}

// =============================================================================
// SPEAKING ORDER
// =============================================================================

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn append_order(&self, req: NewPersonaOrder) -> Result<PersonaOrder> {
        let mut state = self.state.write().await;
        state.conversation(req.conversation_id)?;
        state.persona(req.persona_id)?;
        if state
            .orders
            .values()
            .any(|o| o.conversation_id == req.conversation_id && o.position == req.position)
        {
            return Err(Error::Validation(format!(
                "position {} is already taken",
                req.position
            )));
        }
        let order = PersonaOrder {
            id: Uuid::new_v4(),
            conversation_id: req.conversation_id,
            persona_id: req.persona_id,
            position: req.position,
            created_at_utc: Utc::now(),
        };
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn list_order(&self, conversation_id: Uuid) -> Result<Vec<PersonaOrder>> {
        let state = self.state.read().await;
        state.conversation(conversation_id)?;
        let mut out: Vec<PersonaOrder> = state
            .orders
            .values()
            .filter(|o| o.conversation_id == conversation_id)
            .cloned()
            .collect();
        out.sort_by_key(|o| o.position);
        Ok(out)
    }

    async fn remove_order(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        if state.orders.remove(&id).is_none() {
            return Err(Error::NotFound(format!("persona order {}", id)));
        }
        Ok(())
    }

    async fn replace_order(
        &self,
        conversation_id: Uuid,
        entries: Vec<NewPersonaOrder>,
    ) -> Result<Vec<PersonaOrder>> {
        let mut state = self.state.write().await;
        state.conversation(conversation_id)?;
        // Validate everything before discarding the previous order.
        for entry in &entries {
            state.persona(entry.persona_id)?;
            if entry.conversation_id != conversation_id {
                return Err(Error::Validation(
                    "order entry targets a different conversation".to_string(),
                ));
            }
        }
        let mut seen = Vec::new();
        for entry in &entries {
            if seen.contains(&entry.position) {
                return Err(Error::Validation(format!(
                    "position {} is already taken",
                    entry.position
                )));
            }
            seen.push(entry.position);
        }

        state.orders.retain(|_, o| o.conversation_id != conversation_id);
        let now = Utc::now();
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let order = PersonaOrder {
                id: Uuid::new_v4(),
                conversation_id,
                persona_id: entry.persona_id,
                position: entry.position,
                created_at_utc: now,
            };
            state.orders.insert(order.id, order.clone());
            out.push(order);
        }
        out.sort_by_key(|o| o.position);
        Ok(out)
    }
}

// =============================================================================
// VOTES
// =============================================================================

#[async_trait]
impl VoteRepository for MemoryStore {
    async fn upsert_vote(&self, req: NewVote) -> Result<PersonaVote> {
        let mut state = self.state.write().await;
        let conversation = state.conversation(req.conversation_id)?;
        if !conversation.enable_voting {
            return Err(Error::Validation(
                "voting is not enabled for this conversation".to_string(),
            ));
        }
        let turn = state
            .turns
            .get(&req.turn_id)
            .ok_or(Error::TurnNotFound(req.turn_id))?;
        if turn.conversation_id != req.conversation_id {
            return Err(Error::TurnNotFound(req.turn_id));
        }
        state.persona(req.voter_id)?;
        state.persona(req.nominee_id)?;
        if req.voter_id == req.nominee_id {
            return Err(Error::Validation(
                "personas cannot vote for themselves".to_string(),
            ));
        }

        let existing = state
            .votes
            .values()
            .find(|v| v.turn_id == req.turn_id && v.voter_id == req.voter_id)
            .map(|v| v.id);
        if let Some(id) = existing {
            let vote = state
                .votes
                .get_mut(&id)
                .ok_or_else(|| Error::Internal("vote disappeared during upsert".to_string()))?;
            vote.nominee_id = req.nominee_id;
            return Ok(vote.clone());
        }

        let vote = PersonaVote {
            id: Uuid::new_v4(),
            conversation_id: req.conversation_id,
            turn_id: req.turn_id,
            voter_id: req.voter_id,
            nominee_id: req.nominee_id,
            created_at_utc: Utc::now(),
        };
        state.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    async fn list_votes(&self, turn_id: Uuid) -> Result<Vec<PersonaVote>> {
        let state = self.state.read().await;
        if !state.turns.contains_key(&turn_id) {
            return Err(Error::TurnNotFound(turn_id));
        }
        let mut out: Vec<PersonaVote> = state
            .votes
            .values()
            .filter(|v| v.turn_id == turn_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.created_at_utc
                .cmp(&b.created_at_utc)
                .then(a.id.cmp(&b.id))
        });
        Ok(out)
    }

    async fn remove_vote(&self, turn_id: Uuid, voter_id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let id = state
            .votes
            .values()
            .find(|v| v.turn_id == turn_id && v.voter_id == voter_id)
            .map(|v| v.id)
            .ok_or_else(|| Error::NotFound(format!("vote by {} on turn {}", voter_id, turn_id)))?;
        state.votes.remove(&id);
        Ok(())
    }
}
