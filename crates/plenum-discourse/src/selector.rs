//! Persona selection.
//!
//! Picks which persona speaks on a given turn. Turn 1 is a uniform random
//! choice among active personas (synthesizing a default persona when none
//! exist); turn 2 additionally excludes the opening speaker; later turns
//! maximize productive disagreement by scoring each candidate's past
//! responses against every other persona's past responses.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, info};
use uuid::Uuid;

use plenum_core::{
    defaults, DiscourseStore, EmbeddingBackend, Error, NewPersona, PersonaConfig, Result, Turn,
    Vector,
};
use plenum_search::cosine_similarity;

/// Selects the speaking persona for a turn.
pub struct PersonaSelector {
    store: Arc<dyn DiscourseStore>,
    embedder: Arc<dyn EmbeddingBackend>,
}

impl PersonaSelector {
    /// Create a selector over the given store and embedder.
    pub fn new(store: Arc<dyn DiscourseStore>, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self { store, embedder }
    }

    /// Select the persona for turn `turn_number` of a conversation.
    ///
    /// Ties on the disagreement score break toward the lowest persona id,
    /// so repeated evaluation over the same state is stable.
    pub async fn select(&self, conversation_id: Uuid, turn_number: i32) -> Result<PersonaConfig> {
        let active = self.store.list_active_personas().await?;

        if turn_number <= 1 {
            if active.is_empty() {
                return self.synthesize_default().await;
            }
            return pick_random(&active);
        }

        if active.is_empty() {
            return Err(Error::NotFound("no active personas".to_string()));
        }

        let history = self
            .store
            .list_turns_before(conversation_id, turn_number)
            .await?;
        let previous_persona = history.last().and_then(|t| t.persona_id);

        let mut candidates: Vec<&PersonaConfig> = active
            .iter()
            .filter(|p| Some(p.id) != previous_persona)
            .collect();
        if candidates.is_empty() {
            // Only the previous speaker remains; allow a repeat.
            candidates = active.iter().collect();
        }

        if turn_number == 2 {
            return pick_random_ref(&candidates);
        }

        self.select_by_disagreement(conversation_id, &candidates, &history)
            .await
    }

    /// Score candidates by average pairwise disagreement and return the
    /// highest.
    async fn select_by_disagreement(
        &self,
        conversation_id: Uuid,
        candidates: &[&PersonaConfig],
        history: &[Turn],
    ) -> Result<PersonaConfig> {
        // Embed each attributed response once, keyed by turn id.
        let mut embeddings: HashMap<Uuid, Vector> = HashMap::new();
        for turn in history.iter().filter(|t| t.persona_id.is_some()) {
            let vector = self.embedder.embed(&turn.response).await?;
            embeddings.insert(turn.id, vector);
        }

        let mut scored: Vec<(f32, &PersonaConfig)> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let score = disagreement_score(candidate.id, history, &embeddings);
            debug!(
                conversation_id = %conversation_id,
                persona_id = %candidate.id,
                disagreement = score,
                "Scored persona candidate"
            );
            scored.push((score, candidate));
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.id.cmp(&b.1.id))
        });

        let (score, winner) = scored
            .first()
            .ok_or_else(|| Error::NotFound("no persona candidates".to_string()))?;
        debug!(
            conversation_id = %conversation_id,
            persona_id = %winner.id,
            disagreement = score,
            "Selected persona by disagreement"
        );
        Ok((*winner).clone())
    }

    /// Create and persist the default persona used when none are active.
    async fn synthesize_default(&self) -> Result<PersonaConfig> {
        info!("No active personas; synthesizing default persona");
        self.store
            .create_persona(NewPersona {
                name: "moderator".to_string(),
                provider: "openai".to_string(),
                model_id: "gpt-4o".to_string(),
                persona_name: defaults::DEFAULT_PERSONA_NAME.to_string(),
                persona_description: "A neutral moderator who keeps the discussion grounded \
                                      in the shared documents."
                    .to_string(),
                persona_instructions: "Summarize the state of the discussion and raise the \
                                       questions the documents leave open."
                    .to_string(),
                ..NewPersona::default()
            })
            .await
    }
}

/// Average pairwise disagreement between a persona's past responses and all
/// other personas' past responses. Candidates with no history, or with no
/// other responses to compare against, score neutrally.
fn disagreement_score(
    persona_id: Uuid,
    history: &[Turn],
    embeddings: &HashMap<Uuid, Vector>,
) -> f32 {
    let own: Vec<&Turn> = history
        .iter()
        .filter(|t| t.persona_id == Some(persona_id))
        .collect();
    if own.is_empty() {
        return defaults::NEUTRAL_DISAGREEMENT;
    }

    let others: Vec<&Turn> = history
        .iter()
        .filter(|t| t.persona_id.is_some() && t.persona_id != Some(persona_id))
        .collect();
    if others.is_empty() {
        return defaults::NEUTRAL_DISAGREEMENT;
    }

    let mut total = 0.0f32;
    let mut pairs = 0usize;
    for own_turn in &own {
        for other_turn in &others {
            if let (Some(a), Some(b)) = (embeddings.get(&own_turn.id), embeddings.get(&other_turn.id))
            {
                total += 1.0 - cosine_similarity(a, b);
                pairs += 1;
            }
        }
    }

    if pairs == 0 {
        defaults::NEUTRAL_DISAGREEMENT
    } else {
        total / pairs as f32
    }
}

fn pick_random(personas: &[PersonaConfig]) -> Result<PersonaConfig> {
    personas
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| Error::NotFound("no active personas".to_string()))
}

fn pick_random_ref(personas: &[&PersonaConfig]) -> Result<PersonaConfig> {
    personas
        .choose(&mut rand::thread_rng())
        .map(|p| (*p).clone())
        .ok_or_else(|| Error::NotFound("no active personas".to_string()))
}
