//! Structured logging schema and field name constants for plenum.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (retrieval hits, chunks) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "store", "segment", "search", "inference", "discourse"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "segmenter", "multi_query", "dispatcher", "selector"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "process_document", "generate_turn", "resolve_next_speaker"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Conversation UUID being operated on.
pub const CONVERSATION_ID: &str = "conversation_id";

/// Document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Turn UUID being operated on.
pub const TURN_ID: &str = "turn_id";

/// 1-based turn number within a conversation.
pub const TURN_NUMBER: &str = "turn_number";

/// Persona UUID speaking or being selected.
pub const PERSONA_ID: &str = "persona_id";

/// Retrieval query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by retrieval.
pub const RESULT_COUNT: &str = "result_count";

/// Number of chunks produced or embedded.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Byte length of an assembled prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model completion.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model identifier used for a completion or embedding.
pub const MODEL: &str = "model";

/// Provider identifier a completion was routed to.
pub const PROVIDER: &str = "provider";

// ─── Discourse fields ──────────────────────────────────────────────────────

/// Next-speaker selection method: "override", "voting", "order".
pub const SELECTION_METHOD: &str = "selection_method";

/// Vote count behind a voting-based selection.
pub const VOTE_COUNT: &str = "vote_count";

/// Disagreement score behind a selector decision.
pub const DISAGREEMENT: &str = "disagreement";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Install the process-wide tracing subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Safe to call more
/// than once; later calls are no-ops.
pub fn init() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
