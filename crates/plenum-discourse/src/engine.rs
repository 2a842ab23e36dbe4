//! Discourse engine facade.
//!
//! The entry points the API layer calls: `process_document` (two-phase
//! segment-then-embed pipeline), `generate_turn` (retrieve, assemble,
//! dispatch, parse, persist), and `resolve_next_speaker`. A turn row is
//! written only after its completion fully resolves, including the
//! placeholder degradation paths, so no turn is ever half-persisted.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use plenum_core::{
    CompletionRequest, DiscourseStore, EmbeddingBackend, Error, NewChunk, NewTurn, PersonaConfig,
    Result, Turn,
};
use plenum_inference::ProviderDispatcher;
use plenum_search::{RetrievalConfig, RetrievalEngine};
use plenum_segment::{Segmenter, SegmenterConfig};

use crate::context::{build_system_prompt, build_user_content, RetrievedPassage};
use crate::parser::parse_dual_track;
use crate::resolver::{NextSpeaker, NextSpeakerResolver};
use crate::selector::PersonaSelector;

/// Engine-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub segmenter: SegmenterConfig,
    pub retrieval: RetrievalConfig,
}

/// A generated, persisted turn together with the persona that spoke.
#[derive(Debug, Clone)]
pub struct GeneratedTurn {
    pub turn: Turn,
    pub persona: PersonaConfig,
}

/// Orchestrates the discourse core against the storage collaborator and
/// the inference backends.
pub struct DiscourseEngine {
    store: Arc<dyn DiscourseStore>,
    embedder: Arc<dyn EmbeddingBackend>,
    dispatcher: ProviderDispatcher,
    segmenter: Segmenter,
    retrieval: RetrievalEngine,
    selector: PersonaSelector,
    resolver: NextSpeakerResolver,
}

impl DiscourseEngine {
    /// Create an engine over a store, an embedder, and a dispatcher.
    pub fn new<S>(
        store: Arc<S>,
        embedder: Arc<dyn EmbeddingBackend>,
        dispatcher: ProviderDispatcher,
        config: EngineConfig,
    ) -> Self
    where
        S: DiscourseStore + 'static,
    {
        let retrieval = RetrievalEngine::new(store.clone(), embedder.clone(), config.retrieval);
        let selector = PersonaSelector::new(store.clone(), embedder.clone());
        let resolver = NextSpeakerResolver::new(store.clone());
        Self {
            store,
            embedder,
            dispatcher,
            segmenter: Segmenter::new(config.segmenter),
            retrieval,
            selector,
            resolver,
        }
    }

    /// Segment a document and attach embeddings to its chunks.
    ///
    /// Two phases: all chunks are created first (cheap, local), then
    /// embeddings are attached one by one. A crash or backend failure
    /// between phases leaves recoverable state; re-running resumes
    /// embedding without re-segmenting or duplicating chunks. Returns the
    /// document's chunk count.
    pub async fn process_document(&self, document_id: Uuid) -> Result<usize> {
        let document = self.store.get_document(document_id).await?;

        let mut chunks = self.store.list_chunks_for_document(document_id).await?;
        if chunks.is_empty() {
            let new_chunks: Vec<NewChunk> = self
                .segmenter
                .segment(&document.content)
                .into_iter()
                .map(|segment| NewChunk {
                    document_id,
                    sequence_number: segment.sequence_number,
                    content: segment.content,
                    section_title: segment.section_title,
                    is_section_header: segment.is_section_header,
                    paragraph_id: segment.paragraph_id,
                    semantic_group: segment.semantic_group,
                    importance_score: segment.importance_score,
                })
                .collect();
            chunks = self.store.insert_chunks(new_chunks).await?;
        }

        let total = chunks.len();
        let mut embedded = 0;
        for chunk in chunks.into_iter().filter(|c| !c.has_embedding()) {
            let vector = self.embedder.embed(&chunk.content).await?;
            self.store.attach_embedding(chunk.id, vector).await?;
            embedded += 1;
        }

        info!(
            document_id = %document_id,
            chunk_count = total,
            embedded,
            "Document processed"
        );
        Ok(total)
    }

    /// The turn number the next `generate_turn` call should use.
    pub async fn next_turn_number(&self, conversation_id: Uuid) -> Result<i32> {
        Ok(self.store.last_turn_number(conversation_id).await? + 1)
    }

    /// Generate and persist turn `turn_number` of a conversation.
    ///
    /// `query` grounds retrieval on turn 1; later turns retrieve against
    /// the previous turn's public response. Supplying `persona_id`
    /// bypasses the selector entirely.
    pub async fn generate_turn(
        &self,
        conversation_id: Uuid,
        turn_number: i32,
        query: Option<&str>,
        persona_id: Option<Uuid>,
    ) -> Result<GeneratedTurn> {
        let conversation = self.store.get_conversation(conversation_id).await?;

        let expected = self.store.last_turn_number(conversation_id).await? + 1;
        if turn_number != expected {
            return Err(Error::Validation(format!(
                "turn number {} is stale: next turn for conversation {} is {}",
                turn_number, conversation_id, expected
            )));
        }

        let persona = match persona_id {
            Some(id) => self.store.get_persona(id).await?,
            None => self.selector.select(conversation_id, turn_number).await?,
        };

        let previous_turns = self
            .store
            .list_turns_before(conversation_id, turn_number)
            .await?;

        let base_query = if turn_number == 1 {
            query.unwrap_or_default().to_string()
        } else {
            previous_turns
                .last()
                .map(|t| t.response.clone())
                .unwrap_or_default()
        };

        let retrieved = self
            .retrieval
            .retrieve_multi(&base_query, conversation_id)
            .await?;
        let passages = self.resolve_passages(retrieved).await?;

        let first_turn_query = if turn_number == 1 { query } else { None };
        let request = CompletionRequest {
            model: persona.model_id.clone(),
            system_prompt: build_system_prompt(&persona, turn_number, first_turn_query),
            user_content: build_user_content(&conversation.name, &previous_turns, &passages),
            temperature: persona.temperature,
            max_tokens: persona.max_tokens,
            top_p: persona.top_p,
            extra_params: persona.provider_parameters.clone(),
        };

        let raw = self.dispatcher.dispatch(&persona.provider, &request).await?;
        let parsed = parse_dual_track(&raw);

        let turn = self
            .store
            .append_turn(NewTurn {
                conversation_id,
                turn_number,
                persona_id: Some(persona.id),
                response: parsed.public_response,
                private_thoughts: Some(parsed.private_thoughts),
                next_override_id: None,
            })
            .await?;

        info!(
            conversation_id = %conversation_id,
            turn_number,
            persona_id = %persona.id,
            response_len = turn.response.len(),
            "Turn generated"
        );
        Ok(GeneratedTurn { turn, persona })
    }

    /// Resolve who speaks after `turn_id`.
    ///
    /// An unresolved outcome (no override, no votes, no configured order)
    /// is reported as a not-found condition.
    pub async fn resolve_next_speaker(
        &self,
        conversation_id: Uuid,
        turn_id: Uuid,
    ) -> Result<NextSpeaker> {
        match self.resolver.resolve(conversation_id, turn_id).await? {
            NextSpeaker::Unresolved => Err(Error::NotFound(
                "no valid next persona; configure a persona order for this conversation"
                    .to_string(),
            )),
            resolved => Ok(resolved),
        }
    }

    /// Resolve retrieved chunks to passages, looking each source document's
    /// filename up once.
    async fn resolve_passages(
        &self,
        chunks: Vec<plenum_core::Chunk>,
    ) -> Result<Vec<RetrievedPassage>> {
        let mut filenames: HashMap<Uuid, String> = HashMap::new();
        let mut passages = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let filename = match filenames.get(&chunk.document_id) {
                Some(filename) => filename.clone(),
                None => {
                    let document = self.store.get_document(chunk.document_id).await?;
                    filenames.insert(chunk.document_id, document.filename.clone());
                    document.filename
                }
            };
            passages.push(RetrievedPassage {
                filename,
                sequence_number: chunk.sequence_number,
                content: chunk.content,
            });
        }
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_core::{
        defaults, ChunkRepository, ConversationRepository, DocumentRepository, NewDocument,
        NewPersona, PersonaRepository, TurnRepository,
    };
    use plenum_inference::mock::MockChatBackend;
    use plenum_inference::{DispatcherConfig, SeededEmbedding};
    use plenum_store::MemoryStore;

    fn engine_with(store: Arc<MemoryStore>, dispatcher: ProviderDispatcher) -> DiscourseEngine {
        DiscourseEngine::new(
            store,
            Arc::new(SeededEmbedding::new(64)),
            dispatcher,
            EngineConfig::default(),
        )
    }

    fn offline_engine(store: Arc<MemoryStore>) -> DiscourseEngine {
        engine_with(
            store,
            ProviderDispatcher::new(DispatcherConfig::default()).unwrap(),
        )
    }

    fn persona_req(name: &str) -> NewPersona {
        NewPersona {
            name: name.to_string(),
            provider: "openai".to_string(),
            model_id: "gpt-4o".to_string(),
            persona_name: name.to_string(),
            persona_description: "test".to_string(),
            persona_instructions: "test".to_string(),
            ..NewPersona::default()
        }
    }

    async fn seed_document(store: &MemoryStore, conversation_id: Uuid, content: &str) -> Uuid {
        store
            .create_document(NewDocument {
                conversation_id,
                filename: "paper.txt".to_string(),
                content: content.to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_process_document_chunks_and_embeds() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        let document_id = seed_document(
            &store,
            conversation.id,
            "The glacier retreated rapidly. Scientists measured the loss. Policy lagged behind.",
        )
        .await;

        let engine = offline_engine(store.clone());
        let count = engine.process_document(document_id).await.unwrap();
        assert!(count >= 1);

        let chunks = store.list_chunks_for_document(document_id).await.unwrap();
        assert_eq!(chunks.len(), count);
        for chunk in &chunks {
            let embedding = chunk.embedding.as_ref().unwrap();
            assert_eq!(embedding.len(), 64);
        }
    }

    #[tokio::test]
    async fn test_process_document_resumes_after_partial_embedding() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        let document_id = seed_document(
            &store,
            conversation.id,
            "Alpha Corp announced earnings. Beta Industries responded sharply.",
        )
        .await;

        let engine = offline_engine(store.clone());
        let count = engine.process_document(document_id).await.unwrap();

        // Re-running must not re-segment or duplicate chunks.
        let second = engine.process_document(document_id).await.unwrap();
        assert_eq!(second, count);
        let chunks = store.list_chunks_for_document(document_id).await.unwrap();
        assert_eq!(chunks.len(), count);
    }

    #[tokio::test]
    async fn test_generate_first_turn_scenario() {
        // One document of three sentences, one active persona, turn 1 with
        // no query: the turn persists with number 1, the only persona, and
        // a non-empty response.
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("seminar").await.unwrap();
        let persona = store.create_persona(persona_req("solo")).await.unwrap();
        let document_id = seed_document(
            &store,
            conversation.id,
            "The treaty was signed decades ago. Ratification took four years. Enforcement remains disputed.",
        )
        .await;

        let engine = offline_engine(store.clone());
        engine.process_document(document_id).await.unwrap();

        let generated = engine
            .generate_turn(conversation.id, 1, None, None)
            .await
            .unwrap();

        assert_eq!(generated.turn.turn_number, 1);
        assert_eq!(generated.persona.id, persona.id);
        assert_eq!(generated.turn.persona_id, Some(persona.id));
        assert!(!generated.turn.response.is_empty());
        assert!(generated.turn.private_thoughts.is_some());
        assert_eq!(store.last_turn_number(conversation.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_generate_turn_parses_dual_track_completion() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.create_persona(persona_req("speaker")).await.unwrap();

        let mut dispatcher = ProviderDispatcher::new(DispatcherConfig::default()).unwrap();
        dispatcher.register(Arc::new(MockChatBackend::new("openai").with_response(
            "PRIVATE THOUGHTS: weighing the evidence PUBLIC RESPONSE: The evidence is thin.",
        )));

        let engine = engine_with(store.clone(), dispatcher);
        let generated = engine
            .generate_turn(conversation.id, 1, Some("is it true?"), None)
            .await
            .unwrap();

        assert_eq!(generated.turn.response, "The evidence is thin.");
        assert_eq!(
            generated.turn.private_thoughts.as_deref(),
            Some("weighing the evidence")
        );
    }

    #[tokio::test]
    async fn test_generate_turn_without_markers_recovers() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.create_persona(persona_req("speaker")).await.unwrap();

        let mut dispatcher = ProviderDispatcher::new(DispatcherConfig::default()).unwrap();
        dispatcher.register(Arc::new(
            MockChatBackend::new("openai").with_response("A completely unformatted reply."),
        ));

        let engine = engine_with(store.clone(), dispatcher);
        let generated = engine
            .generate_turn(conversation.id, 1, None, None)
            .await
            .unwrap();

        assert_eq!(generated.turn.response, "A completely unformatted reply.");
        assert_eq!(
            generated.turn.private_thoughts.as_deref(),
            Some(defaults::NO_PRIVATE_THOUGHTS)
        );
    }

    #[tokio::test]
    async fn test_generate_turn_survives_provider_outage() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.create_persona(persona_req("speaker")).await.unwrap();

        let mut dispatcher = ProviderDispatcher::new(DispatcherConfig::default()).unwrap();
        dispatcher.register(Arc::new(MockChatBackend::new("openai").failing()));

        let engine = engine_with(store.clone(), dispatcher);
        let generated = engine
            .generate_turn(conversation.id, 1, None, None)
            .await
            .unwrap();

        // The outage degrades to a placeholder; the turn still persists.
        assert!(!generated.turn.response.is_empty());
        assert_eq!(store.last_turn_number(conversation.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_generate_turn_rejects_stale_turn_number() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.create_persona(persona_req("speaker")).await.unwrap();

        let engine = offline_engine(store);
        let result = engine.generate_turn(conversation.id, 2, None, None).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_explicit_persona_bypasses_selector() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.create_persona(persona_req("active")).await.unwrap();
        let benched = store.create_persona(persona_req("benched")).await.unwrap();
        store.set_persona_active(benched.id, false).await.unwrap();

        let engine = offline_engine(store);
        let generated = engine
            .generate_turn(conversation.id, 1, None, Some(benched.id))
            .await
            .unwrap();
        assert_eq!(generated.persona.id, benched.id);
    }

    #[tokio::test]
    async fn test_unresolved_next_speaker_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.create_persona(persona_req("speaker")).await.unwrap();

        let engine = offline_engine(store);
        let generated = engine
            .generate_turn(conversation.id, 1, None, None)
            .await
            .unwrap();

        let result = engine
            .resolve_next_speaker(conversation.id, generated.turn.id)
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_next_turn_number_increments() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.create_persona(persona_req("speaker")).await.unwrap();

        let engine = offline_engine(store);
        assert_eq!(engine.next_turn_number(conversation.id).await.unwrap(), 1);
        engine
            .generate_turn(conversation.id, 1, None, None)
            .await
            .unwrap();
        assert_eq!(engine.next_turn_number(conversation.id).await.unwrap(), 2);
    }
}
