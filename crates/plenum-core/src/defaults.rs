//! Centralized default constants for the plenum system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// SEGMENTATION
// =============================================================================

/// Maximum characters per chunk; the segmenter flushes its buffer before
/// appending a sentence that would exceed this.
pub const CHUNK_MAX_SIZE: usize = 512;

/// Soft minimum characters per chunk. Used only as a target; the segmenter
/// never pads or merges to reach it.
pub const CHUNK_MIN_SIZE: usize = 100;

/// Overlap characters between adjacent chunks. Carried as a configuration
/// constant for the storage collaborator; the semantic segmenter emits
/// disjoint chunks.
pub const CHUNK_OVERLAP: usize = 50;

/// Lines at or above this length are never treated as section headers.
pub const HEADER_MAX_LEN: usize = 100;

/// Semantic-group label for sentences with no detected entity or leading
/// noun phrase.
pub const GENERAL_CONTENT_GROUP: &str = "General Content";

/// Semantic-group label assigned to section-header chunks.
pub const SECTION_HEADER_GROUP: &str = "Section Header";

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding model name (OpenAI-style backends).
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Default embedding vector dimension. Fixed per deployment; every persisted
/// chunk embedding must have exactly this many components.
pub const EMBED_DIMENSION: usize = 1536;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Default number of chunks returned by retrieval (top-K).
pub const RETRIEVAL_LIMIT: usize = 10;

/// Number of reformulated queries used by multi-query retrieval.
pub const MULTI_QUERY_COUNT: usize = 3;

// =============================================================================
// GENERATION
// =============================================================================

/// Default sampling temperature for persona completions.
pub const TEMPERATURE: f32 = 0.7;

/// Default maximum output tokens for persona completions.
pub const MAX_TOKENS: u32 = 500;

/// Default nucleus-sampling parameter for persona completions.
pub const TOP_P: f32 = 1.0;

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// PROVIDER ENDPOINTS
// =============================================================================

/// Default OpenAI API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default Anthropic API endpoint.
pub const ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// Default DeepSeek API endpoint (OpenAI-compatible).
pub const DEEPSEEK_URL: &str = "https://api.deepseek.com";

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// =============================================================================
// DUAL-TRACK OUTPUT
// =============================================================================

/// Literal marker opening the private-reasoning track in model output.
pub const PRIVATE_MARKER: &str = "PRIVATE THOUGHTS:";

/// Literal marker opening the public-response track in model output.
pub const PUBLIC_MARKER: &str = "PUBLIC RESPONSE:";

/// Private-track placeholder recorded when a completion omits the markers.
pub const NO_PRIVATE_THOUGHTS: &str = "No private thoughts provided";

// =============================================================================
// PERSONA SELECTION
// =============================================================================

/// Neutral disagreement score assigned to personas with no prior responses
/// in a conversation.
pub const NEUTRAL_DISAGREEMENT: f32 = 0.5;

/// Advisory threshold below which a pair of personas is considered to be
/// converging. Documentation constant; not wired into selection policy.
pub const DISAGREEMENT_LOW: f32 = 0.3;

/// Advisory threshold above which a pair of personas is considered strongly
/// divergent. Documentation constant; not wired into selection policy.
pub const DISAGREEMENT_HIGH: f32 = 0.7;

/// Persona name used when a default persona must be synthesized because no
/// active persona exists at turn 1.
pub const DEFAULT_PERSONA_NAME: &str = "Moderator";
