//! Mock backends for deterministic testing.
//!
//! Provides a scripted chat backend that logs calls and returns canned
//! completions, for tests that need to observe the exact request a
//! component dispatched or to feed the parser a specific completion shape.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use plenum_core::{ChatBackend, CompletionRequest, Error, Result};

/// A recorded call to the mock chat backend.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system_prompt: String,
    pub user_content: String,
}

#[derive(Debug, Default)]
struct MockConfig {
    provider_id: String,
    default_response: String,
    responses: HashMap<String, String>,
    fail: bool,
}

/// Scripted chat backend with call logging.
#[derive(Clone)]
pub struct MockChatBackend {
    config: Arc<MockConfig>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockChatBackend {
    /// Create a mock for the given provider id.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            config: Arc::new(MockConfig {
                provider_id: provider_id.into(),
                default_response: "Mock response".to_string(),
                responses: HashMap::new(),
                fail: false,
            }),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the default canned response.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Map a specific user-content string to a specific response.
    pub fn with_mapping(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(input.into(), output.into());
        self
    }

    /// Make every call fail, for testing degradation paths.
    pub fn failing(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of completions dispatched.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Clone for MockConfig {
    fn clone(&self) -> Self {
        Self {
            provider_id: self.provider_id.clone(),
            default_response: self.default_response.clone(),
            responses: self.responses.clone(),
            fail: self.fail,
        }
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: req.model.clone(),
            system_prompt: req.system_prompt.clone(),
            user_content: req.user_content.clone(),
        });

        if self.config.fail {
            return Err(Error::Inference("simulated failure".to_string()));
        }

        if let Some(response) = self.config.responses.get(&req.user_content) {
            return Ok(response.clone());
        }
        Ok(self.config.default_response.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.config.fail)
    }

    fn provider_id(&self) -> &str {
        &self.config.provider_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str) -> CompletionRequest {
        CompletionRequest {
            model: "mock-model".to_string(),
            system_prompt: "system".to_string(),
            user_content: content.to_string(),
            temperature: 0.7,
            max_tokens: 500,
            top_p: 1.0,
            extra_params: None,
        }
    }

    #[tokio::test]
    async fn test_mock_default_response() {
        let backend = MockChatBackend::new("openai").with_response("canned");
        assert_eq!(backend.complete(&request("x")).await.unwrap(), "canned");
    }

    #[tokio::test]
    async fn test_mock_mapping() {
        let backend = MockChatBackend::new("openai")
            .with_mapping("hello", "world")
            .with_mapping("foo", "bar");
        assert_eq!(backend.complete(&request("hello")).await.unwrap(), "world");
        assert_eq!(backend.complete(&request("foo")).await.unwrap(), "bar");
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let backend = MockChatBackend::new("openai");
        backend.complete(&request("one")).await.unwrap();
        backend.complete(&request("two")).await.unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(backend.calls()[1].user_content, "two");
    }

    #[tokio::test]
    async fn test_mock_failure_mode() {
        let backend = MockChatBackend::new("openai").failing();
        assert!(backend.complete(&request("x")).await.is_err());
        assert!(!backend.health_check().await.unwrap());
    }
}
