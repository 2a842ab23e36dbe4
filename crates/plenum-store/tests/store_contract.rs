//! Contract tests the external durable store must also satisfy.

use std::sync::Arc;

use plenum_core::{
    ChunkRepository, ConversationRepository, DocumentRepository, Error, NewChunk, NewDocument,
    NewPersona, NewTurn, PersonaRepository, TurnRepository,
};
use plenum_store::MemoryStore;

async fn seed(store: &MemoryStore) -> (uuid::Uuid, uuid::Uuid) {
    let conversation = store.create_conversation("contract").await.unwrap();
    let document = store
        .create_document(NewDocument {
            conversation_id: conversation.id,
            filename: "doc.txt".to_string(),
            content: "body".to_string(),
        })
        .await
        .unwrap();
    (conversation.id, document.id)
}

#[tokio::test]
async fn concurrent_turn_appends_assign_unique_numbers() {
    let store = Arc::new(MemoryStore::new());
    let (conversation_id, _) = seed(&store).await;
    store
        .create_persona(NewPersona {
            name: "p".to_string(),
            provider: "openai".to_string(),
            model_id: "gpt-4o".to_string(),
            persona_name: "p".to_string(),
            persona_description: "d".to_string(),
            persona_instructions: "i".to_string(),
            ..NewPersona::default()
        })
        .await
        .unwrap();

    // Two writers race with the same read-last-then-increment result;
    // exactly one append may win.
    let mut handles = Vec::new();
    for i in 0..2 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .append_turn(NewTurn {
                    conversation_id,
                    turn_number: 1,
                    persona_id: None,
                    response: format!("writer {}", i),
                    private_thoughts: None,
                    next_override_id: None,
                })
                .await
        }));
    }

    let mut successes = 0;
    let mut validation_failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(Error::Validation(_)) => validation_failures += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(validation_failures, 1);

    let turns = store.list_turns(conversation_id).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].turn_number, 1);
}

#[tokio::test]
async fn chunks_persist_without_embeddings_between_phases() {
    let store = MemoryStore::new();
    let (_, document_id) = seed(&store).await;

    let chunks = store
        .insert_chunks(
            (1..=3)
                .map(|n| NewChunk {
                    document_id,
                    sequence_number: n,
                    content: format!("sentence {}", n),
                    section_title: None,
                    is_section_header: false,
                    paragraph_id: Some(1),
                    semantic_group: None,
                    importance_score: 0.0,
                })
                .collect(),
        )
        .await
        .unwrap();

    // Phase one complete, phase two interrupted after the first chunk.
    store
        .attach_embedding(chunks[0].id, vec![0.1; 8])
        .await
        .unwrap();

    let stored = store.list_chunks_for_document(document_id).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored[0].has_embedding());
    assert!(!stored[1].has_embedding());
    assert!(!stored[2].has_embedding());

    // The interrupted state is resumable, not corrupt.
    for chunk in stored.iter().filter(|c| !c.has_embedding()) {
        store
            .attach_embedding(chunk.id, vec![0.2; 8])
            .await
            .unwrap();
    }
    let finished = store.list_chunks_for_document(document_id).await.unwrap();
    assert!(finished.iter().all(|c| c.has_embedding()));
}

#[tokio::test]
async fn document_delete_cascades_to_chunks_only() {
    let store = MemoryStore::new();
    let (conversation_id, document_id) = seed(&store).await;

    store
        .insert_chunks(vec![NewChunk {
            document_id,
            sequence_number: 1,
            content: "text".to_string(),
            section_title: None,
            is_section_header: false,
            paragraph_id: None,
            semantic_group: None,
            importance_score: 0.0,
        }])
        .await
        .unwrap();

    store.delete_document(document_id).await.unwrap();
    assert!(store
        .list_chunks_for_conversation(conversation_id)
        .await
        .unwrap()
        .is_empty());
    // The owning conversation survives.
    assert!(store.get_conversation(conversation_id).await.is_ok());
}
