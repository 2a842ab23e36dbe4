//! Prompt assembly.
//!
//! Builds the system instruction (persona identity, non-consensus
//! directive, dual-track format requirement) and the grounded user-content
//! block (conversation name, prior-turn transcript, retrieved passages).

use plenum_core::{defaults, PersonaConfig, Turn};

/// A retrieved chunk resolved to its source document for prompting.
#[derive(Debug, Clone)]
pub struct RetrievedPassage {
    pub filename: String,
    pub sequence_number: i32,
    pub content: String,
}

/// Build the system instruction for a turn.
///
/// Turn 1 directives reference the originating query when one was supplied
/// and otherwise instruct the persona to open the discussion from the
/// documents alone.
pub fn build_system_prompt(
    persona: &PersonaConfig,
    turn_number: i32,
    query: Option<&str>,
) -> String {
    let directive = if turn_number == 1 {
        match query {
            Some(query) => format!(
                "The discussion opens with this query: '{}'. Ground your response in the \
                 relevant document chunks.",
                query
            ),
            None => "Open the discussion by introducing the topic based on the document \
                     chunks provided."
                .to_string(),
        }
    } else {
        "Continue the conversation by responding to the previous turns. Consider both the \
         conversation history and the relevant document chunks."
            .to_string()
    };

    format!(
        "You are {name}, one of several personas in a multi-persona discourse about a shared \
         set of documents. {description}\n\n\
         Do not seek consensus. Where you see a weak argument, an unstated assumption, or a \
         reading of the documents you find wrong, say so and defend your own position.\n\n\
         {instructions}\n\n\
         {directive}\n\n\
         Structure your reply in exactly two labeled tracks. Begin with the literal marker \
         '{private}' followed by your private reasoning, then the literal marker '{public}' \
         followed by the response the other personas will see.",
        name = persona.persona_name,
        description = persona.persona_description,
        instructions = persona.persona_instructions,
        directive = directive,
        private = defaults::PRIVATE_MARKER,
        public = defaults::PUBLIC_MARKER,
    )
}

/// Build the user-content block: conversation name, full prior-turn
/// transcript in turn order, and the retrieved passages.
pub fn build_user_content(
    conversation_name: &str,
    previous_turns: &[Turn],
    passages: &[RetrievedPassage],
) -> String {
    let mut content = format!("Conversation: {}\n\n", conversation_name);

    if !previous_turns.is_empty() {
        content.push_str("Previous turns:\n");
        for turn in previous_turns {
            content.push_str(&format!("Turn {}: {}\n\n", turn.turn_number, turn.response));
        }
    }

    if !passages.is_empty() {
        content.push_str("Relevant document chunks:\n");
        for passage in passages {
            content.push_str(&format!(
                "From {}, chunk {}: {}\n\n",
                passage.filename, passage.sequence_number, passage.content
            ));
        }
    }

    content
}
