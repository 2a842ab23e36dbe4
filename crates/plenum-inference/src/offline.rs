//! Offline placeholder backend.
//!
//! Stands in for any provider whose credentials are not configured. The
//! placeholder completion is deterministic for a given request and carries
//! both literal track markers, so the parse-and-persist pipeline behaves
//! identically with and without live credentials.

use async_trait::async_trait;
use tracing::debug;

use plenum_core::{defaults, ChatBackend, CompletionRequest, Result};

/// Deterministic placeholder chat backend.
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    provider_id: String,
}

impl OfflineBackend {
    /// Create a placeholder backend standing in for `provider_id`.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }

    /// The placeholder completion for a request.
    pub fn placeholder(&self, req: &CompletionRequest) -> String {
        format!(
            "{} No credentials are configured for provider '{}'; this is an offline placeholder. \
             {} This is a placeholder response from model '{}'. Configure credentials for \
             provider '{}' to generate real completions.",
            defaults::PRIVATE_MARKER,
            self.provider_id,
            defaults::PUBLIC_MARKER,
            req.model,
            self.provider_id
        )
    }
}

#[async_trait]
impl ChatBackend for OfflineBackend {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        debug!(
            provider = %self.provider_id,
            model = %req.model,
            "Emitting offline placeholder completion"
        );
        Ok(self.placeholder(req))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn provider_id(&self) -> &str {
        &self.provider_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".to_string(),
            system_prompt: String::new(),
            user_content: "anything".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            top_p: 1.0,
            extra_params: None,
        }
    }

    #[tokio::test]
    async fn test_placeholder_contains_both_markers() {
        let backend = OfflineBackend::new("openai");
        let text = backend.complete(&request()).await.unwrap();
        assert!(text.contains(defaults::PRIVATE_MARKER));
        assert!(text.contains(defaults::PUBLIC_MARKER));
    }

    #[tokio::test]
    async fn test_placeholder_is_deterministic() {
        let backend = OfflineBackend::new("anthropic");
        let a = backend.complete(&request()).await.unwrap();
        let b = backend.complete(&request()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_placeholder_names_provider_and_model() {
        let backend = OfflineBackend::new("deepseek");
        let text = backend.complete(&request()).await.unwrap();
        assert!(text.contains("deepseek"));
        assert!(text.contains("gpt-4o"));
    }
}
