//! # plenum-inference
//!
//! Embedding and chat-completion backend abstraction for plenum.
//!
//! This crate provides:
//! - OpenAI-style embedding backend and a seeded deterministic fallback
//! - OpenAI-style chat backend (also serves DeepSeek's compatible API)
//! - Anthropic-style chat backend
//! - Offline placeholder backend emitting both dual-track markers
//! - Provider dispatcher with injected credential configuration
//!
//! # Feature Flags
//!
//! - `mock`: Expose the scripted mock backend to downstream test suites

pub mod anthropic;
pub mod dispatcher;
pub mod embedding;
pub mod offline;
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use plenum_core::{ChatBackend, CompletionRequest, EmbeddingBackend};

pub use anthropic::{AnthropicStyleBackend, AnthropicStyleConfig};
pub use dispatcher::{DispatcherConfig, ProviderCredentials, ProviderDispatcher};
pub use embedding::{
    embedding_backend_from_env, EmbeddingConfig, OpenAIEmbedding, SeededEmbedding,
};
pub use offline::OfflineBackend;
pub use openai::{OpenAIStyleBackend, OpenAIStyleConfig};
