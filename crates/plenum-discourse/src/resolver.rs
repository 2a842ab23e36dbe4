//! Next-speaker resolution.
//!
//! For a completed turn, determines who speaks next by evaluating three
//! signals in strict priority order: the turn's explicit override, then
//! persona votes (when the conversation has voting enabled), then the
//! conversation's fixed rotation order. A pure read-side computation over
//! persisted state; safe to re-evaluate at any time.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use plenum_core::{DiscourseStore, Result};

/// Resolution outcome for the next speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum NextSpeaker {
    /// The turn carried an explicit override.
    #[serde(rename = "override")]
    Overridden {
        persona_id: Uuid,
        persona_name: String,
    },
    /// Votes decided the nominee.
    #[serde(rename = "voting")]
    Voted {
        persona_id: Uuid,
        persona_name: String,
        vote_count: usize,
    },
    /// Fell back to the rotation order.
    #[serde(rename = "order")]
    Rotated {
        persona_id: Uuid,
        persona_name: String,
        order_position: i32,
    },
    /// No signal produced a speaker; the caller reports not-found.
    Unresolved,
}

impl NextSpeaker {
    /// The resolved persona id, if any.
    pub fn persona_id(&self) -> Option<Uuid> {
        match self {
            Self::Overridden { persona_id, .. }
            | Self::Voted { persona_id, .. }
            | Self::Rotated { persona_id, .. } => Some(*persona_id),
            Self::Unresolved => None,
        }
    }
}

/// Resolves the next speaker after a completed turn.
pub struct NextSpeakerResolver {
    store: Arc<dyn DiscourseStore>,
}

impl NextSpeakerResolver {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<dyn DiscourseStore>) -> Self {
        Self { store }
    }

    /// Resolve the next speaker for `turn_id` in `conversation_id`.
    ///
    /// Vote ties break toward the lowest persona id among the tied
    /// nominees, making resolution a pure function of persisted state.
    pub async fn resolve(&self, conversation_id: Uuid, turn_id: Uuid) -> Result<NextSpeaker> {
        let conversation = self.store.get_conversation(conversation_id).await?;
        let turn = self.store.get_turn(turn_id).await?;
        if turn.conversation_id != conversation_id {
            return Err(plenum_core::Error::TurnNotFound(turn_id));
        }

        // 1. Explicit override wins outright when it names a live persona.
        if let Some(override_id) = turn.next_override_id {
            if let Ok(persona) = self.store.get_persona(override_id).await {
                debug!(
                    conversation_id = %conversation_id,
                    turn_id = %turn_id,
                    persona_id = %persona.id,
                    selection_method = "override",
                    "Next speaker resolved"
                );
                return Ok(NextSpeaker::Overridden {
                    persona_id: persona.id,
                    persona_name: persona.name,
                });
            }
        }

        // 2. Votes, when the conversation allows them.
        if conversation.enable_voting {
            if let Some(speaker) = self.resolve_by_votes(turn_id).await? {
                debug!(
                    conversation_id = %conversation_id,
                    turn_id = %turn_id,
                    selection_method = "voting",
                    "Next speaker resolved"
                );
                return Ok(speaker);
            }
        }

        // 3. Rotation order.
        let order = self.store.list_order(conversation_id).await?;
        if order.is_empty() {
            return Ok(NextSpeaker::Unresolved);
        }
        let entry = &order[turn.turn_number as usize % order.len()];
        match self.store.get_persona(entry.persona_id).await {
            Ok(persona) => {
                debug!(
                    conversation_id = %conversation_id,
                    turn_id = %turn_id,
                    persona_id = %persona.id,
                    selection_method = "order",
                    "Next speaker resolved"
                );
                Ok(NextSpeaker::Rotated {
                    persona_id: persona.id,
                    persona_name: persona.name,
                    order_position: entry.position,
                })
            }
            Err(_) => Ok(NextSpeaker::Unresolved),
        }
    }

    /// Count votes by nominee; most votes wins, ties to the lowest id.
    async fn resolve_by_votes(&self, turn_id: Uuid) -> Result<Option<NextSpeaker>> {
        let votes = self.store.list_votes(turn_id).await?;
        if votes.is_empty() {
            return Ok(None);
        }

        let mut counts: HashMap<Uuid, usize> = HashMap::new();
        for vote in &votes {
            *counts.entry(vote.nominee_id).or_insert(0) += 1;
        }

        let mut tallies: Vec<(Uuid, usize)> = counts.into_iter().collect();
        tallies.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let (nominee_id, vote_count) = tallies[0];

        match self.store.get_persona(nominee_id).await {
            Ok(persona) => Ok(Some(NextSpeaker::Voted {
                persona_id: persona.id,
                persona_name: persona.name,
                vote_count,
            })),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_core::{
        ConversationRepository, NewPersona, NewPersonaOrder, NewTurn, NewVote, OrderRepository,
        PersonaRepository, TurnRepository, VoteRepository,
    };
    use plenum_store::MemoryStore;

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

    async fn turn_with_override(
        store: &MemoryStore,
        conversation_id: Uuid,
        n: i32,
        override_id: Option<Uuid>,
    ) -> Uuid {
        store
            .append_turn(NewTurn {
                conversation_id,
                turn_number: n,
                persona_id: None,
                response: format!("turn {}", n),
                private_thoughts: None,
                next_override_id: override_id,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_override_beats_votes_and_order() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.set_voting(conversation.id, true).await.unwrap();
        let chosen = store.create_persona(persona_req("chosen")).await.unwrap();
        let rival = store.create_persona(persona_req("rival")).await.unwrap();
        let voter = store.create_persona(persona_req("voter")).await.unwrap();

        let turn_id =
            turn_with_override(&store, conversation.id, 1, Some(chosen.id)).await;

        // Votes and an order both point elsewhere.
        store
            .upsert_vote(NewVote {
                conversation_id: conversation.id,
                turn_id,
                voter_id: voter.id,
                nominee_id: rival.id,
            })
            .await
            .unwrap();
        store
            .append_order(NewPersonaOrder {
                conversation_id: conversation.id,
                persona_id: rival.id,
                position: 0,
            })
            .await
            .unwrap();

        let resolver = NextSpeakerResolver::new(store);
        let resolved = resolver.resolve(conversation.id, turn_id).await.unwrap();
        assert_eq!(resolved.persona_id(), Some(chosen.id));
        assert!(matches!(resolved, NextSpeaker::Overridden { .. }));
    }

    #[tokio::test]
    async fn test_vote_majority_wins() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.set_voting(conversation.id, true).await.unwrap();

        let a = store.create_persona(persona_req("a")).await.unwrap();
        let b = store.create_persona(persona_req("b")).await.unwrap();
        let voters: Vec<_> = {
            let mut out = Vec::new();
            for name in ["v1", "v2", "v3", "v4"] {
                out.push(store.create_persona(persona_req(name)).await.unwrap());
            }
            out
        };

        let turn_id = turn_with_override(&store, conversation.id, 1, None).await;

        // 3-1 split for b over a.
        for (i, voter) in voters.iter().enumerate() {
            let nominee = if i == 0 { a.id } else { b.id };
            store
                .upsert_vote(NewVote {
                    conversation_id: conversation.id,
                    turn_id,
                    voter_id: voter.id,
                    nominee_id: nominee,
                })
                .await
                .unwrap();
        }

        let resolver = NextSpeakerResolver::new(store);
        let resolved = resolver.resolve(conversation.id, turn_id).await.unwrap();
        match resolved {
            NextSpeaker::Voted {
                persona_id,
                vote_count,
                ..
            } => {
                assert_eq!(persona_id, b.id);
                assert_eq!(vote_count, 3);
            }
            other => panic!("Expected voting resolution, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_vote_tie_breaks_to_lowest_persona_id() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        store.set_voting(conversation.id, true).await.unwrap();

        let a = store.create_persona(persona_req("a")).await.unwrap();
        let b = store.create_persona(persona_req("b")).await.unwrap();
        let v1 = store.create_persona(persona_req("v1")).await.unwrap();
        let v2 = store.create_persona(persona_req("v2")).await.unwrap();

        let turn_id = turn_with_override(&store, conversation.id, 1, None).await;
        for (voter, nominee) in [(v1.id, a.id), (v2.id, b.id)] {
            store
                .upsert_vote(NewVote {
                    conversation_id: conversation.id,
                    turn_id,
                    voter_id: voter,
                    nominee_id: nominee,
                })
                .await
                .unwrap();
        }

        let expected = a.id.min(b.id);
        let resolver = NextSpeakerResolver::new(store);
        let resolved = resolver.resolve(conversation.id, turn_id).await.unwrap();
        assert_eq!(resolved.persona_id(), Some(expected));
    }

    #[tokio::test]
    async fn test_voting_disabled_falls_through_to_rotation() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        let a = store.create_persona(persona_req("a")).await.unwrap();

        let turn_id = turn_with_override(&store, conversation.id, 1, None).await;
        store
            .append_order(NewPersonaOrder {
                conversation_id: conversation.id,
                persona_id: a.id,
                position: 0,
            })
            .await
            .unwrap();

        let resolver = NextSpeakerResolver::new(store);
        let resolved = resolver.resolve(conversation.id, turn_id).await.unwrap();
        assert!(matches!(resolved, NextSpeaker::Rotated { .. }));
    }

    #[tokio::test]
    async fn test_rotation_indexes_by_turn_number_mod_len() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();

        let mut personas = Vec::new();
        for name in ["p0", "p1", "p2"] {
            personas.push(store.create_persona(persona_req(name)).await.unwrap());
        }
        for (position, persona) in personas.iter().enumerate() {
            store
                .append_order(NewPersonaOrder {
                    conversation_id: conversation.id,
                    persona_id: persona.id,
                    position: position as i32,
                })
                .await
                .unwrap();
        }

        let resolver = NextSpeakerResolver::new(store.clone());

        // Turn 1 → order[1 % 3] = p1; turn 2 → p2; turn 3 → p0.
        let expectations = [(1, 1usize), (2, 2), (3, 0)];
        for (turn_number, expected_idx) in expectations {
            let turn_id = turn_with_override(&store, conversation.id, turn_number, None).await;
            let resolved = resolver.resolve(conversation.id, turn_id).await.unwrap();
            match resolved {
                NextSpeaker::Rotated {
                    persona_id,
                    order_position,
                    ..
                } => {
                    assert_eq!(persona_id, personas[expected_idx].id);
                    assert_eq!(order_position, expected_idx as i32);
                }
                other => panic!("Expected rotation, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_no_order_is_unresolved() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c").await.unwrap();
        let turn_id = turn_with_override(&store, conversation.id, 1, None).await;

        let resolver = NextSpeakerResolver::new(store);
        let resolved = resolver.resolve(conversation.id, turn_id).await.unwrap();
        assert_eq!(resolved, NextSpeaker::Unresolved);
        assert_eq!(resolved.persona_id(), None);
    }

    #[tokio::test]
    async fn test_turn_from_other_conversation_rejected() {
        let store = Arc::new(MemoryStore::new());
        let conversation = store.create_conversation("c1").await.unwrap();
        let other = store.create_conversation("c2").await.unwrap();
        let turn_id = turn_with_override(&store, other.id, 1, None).await;

        let resolver = NextSpeakerResolver::new(store);
        let result = resolver.resolve(conversation.id, turn_id).await;
        assert!(matches!(
            result,
            Err(plenum_core::Error::TurnNotFound(_))
        ));
    }

    #[test]
    fn test_next_speaker_serializes_with_method_tag() {
        let speaker = NextSpeaker::Voted {
            persona_id: Uuid::nil(),
            persona_name: "b".to_string(),
            vote_count: 3,
        };
        let json = serde_json::to_value(&speaker).unwrap();
        assert_eq!(json["method"], "voting");
        assert_eq!(json["vote_count"], 3);
    }
}
