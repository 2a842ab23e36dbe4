//! OpenAI-style chat-completion backend.
//!
//! Serves any provider speaking the `/chat/completions` wire format,
//! including DeepSeek, which differs only in base URL and model names.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use plenum_core::{defaults, ChatBackend, CompletionRequest, Error, Result};

/// Configuration for an OpenAI-style chat backend.
#[derive(Debug, Clone)]
pub struct OpenAIStyleConfig {
    /// Provider identifier this backend serves, e.g. "openai", "deepseek".
    pub provider_id: String,
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIStyleConfig {
    fn default() -> Self {
        Self {
            provider_id: "openai".to_string(),
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            timeout_seconds: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

impl OpenAIStyleConfig {
    /// Configuration for the DeepSeek endpoint, which is wire-compatible.
    pub fn deepseek(api_key: Option<String>) -> Self {
        Self {
            provider_id: "deepseek".to_string(),
            base_url: defaults::DEEPSEEK_URL.to_string(),
            api_key,
            timeout_seconds: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(flatten)]
    extra: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// OpenAI-style chat-completion backend.
pub struct OpenAIStyleBackend {
    client: Client,
    config: OpenAIStyleConfig,
}

impl OpenAIStyleBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAIStyleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            provider = %config.provider_id,
            base_url = %config.base_url,
            "Initializing OpenAI-style chat backend"
        );
        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIStyleConfig {
        &self.config
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req.header("Content-Type", "application/json")
    }

    /// Extra parameters must be a JSON object to flatten into the body;
    /// anything else is dropped with a warning.
    fn sanitize_extra(&self, extra: &Option<JsonValue>) -> Option<JsonValue> {
        match extra {
            Some(JsonValue::Object(map)) if !map.is_empty() => {
                Some(JsonValue::Object(map.clone()))
            }
            Some(JsonValue::Object(_)) | None => None,
            Some(other) => {
                warn!(
                    provider = %self.config.provider_id,
                    "Ignoring non-object extra parameters: {}",
                    other
                );
                None
            }
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAIStyleBackend {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        debug!(
            provider = %self.config.provider_id,
            model = %req.model,
            prompt_len = req.system_prompt.len() + req.user_content.len(),
            "Running chat completion"
        );

        let mut messages = Vec::new();
        if !req.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: req.system_prompt.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: req.user_content.clone(),
        });

        let body = ChatCompletionBody {
            model: req.model.clone(),
            messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            top_p: req.top_p,
            extra: self.sanitize_extra(&req.extra_params),
        };

        let response = self
            .build_request("/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ApiErrorResponse>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Inference(format!(
                "{} returned {}: {}",
                self.config.provider_id, status, message
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        debug!(
            provider = %self.config.provider_id,
            response_len = content.len(),
            "Chat completion finished"
        );
        Ok(content)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let mut req = self.client.get(&url).timeout(Duration::from_secs(5));
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!(
                    provider = %self.config.provider_id,
                    "Health check failed: {}",
                    resp.status()
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    provider = %self.config.provider_id,
                    "Health check error: {}",
                    e
                );
                Ok(false)
            }
        }
    }

    fn provider_id(&self) -> &str {
        &self.config.provider_id
    }
}
