//! Anthropic-style chat-completion backend.
//!
//! Speaks the `/v1/messages` wire format: `x-api-key` authentication, an
//! explicit API version header, a top-level system prompt, and content
//! blocks in the response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use plenum_core::{defaults, ChatBackend, CompletionRequest, Error, Result};

/// Configuration for an Anthropic-style chat backend.
#[derive(Debug, Clone)]
pub struct AnthropicStyleConfig {
    /// Provider identifier this backend serves.
    pub provider_id: String,
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: Option<String>,
    /// API version header value.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for AnthropicStyleConfig {
    fn default() -> Self {
        Self {
            provider_id: "anthropic".to_string(),
            base_url: defaults::ANTHROPIC_URL.to_string(),
            api_key: None,
            api_version: defaults::ANTHROPIC_VERSION.to_string(),
            timeout_seconds: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesBody {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<MessageParam>,
    temperature: f32,
    top_p: f32,
    #[serde(flatten)]
    extra: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Anthropic-style chat-completion backend.
pub struct AnthropicStyleBackend {
    client: Client,
    config: AnthropicStyleConfig,
}

impl AnthropicStyleBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: AnthropicStyleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            provider = %config.provider_id,
            base_url = %config.base_url,
            "Initializing Anthropic-style chat backend"
        );
        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AnthropicStyleConfig {
        &self.config
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self
            .client
            .post(&url)
            .header("anthropic-version", &self.config.api_version)
            .header("Content-Type", "application/json");
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }
        req
    }

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
impl ChatBackend for AnthropicStyleBackend {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        debug!(
            provider = %self.config.provider_id,
            model = %req.model,
            prompt_len = req.system_prompt.len() + req.user_content.len(),
            "Running chat completion"
        );

        let body = MessagesBody {
            model: req.model.clone(),
            max_tokens: req.max_tokens,
            system: req.system_prompt.clone(),
            messages: vec![MessageParam {
                role: "user",
                content: req.user_content.clone(),
            }],
            temperature: req.temperature,
            top_p: req.top_p,
            extra: self.sanitize_extra(&req.extra_params),
        };

        let response = self
            .build_request("/v1/messages")
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

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content: String = result
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        debug!(
            provider = %self.config.provider_id,
            response_len = content.len(),
            "Chat completion finished"
        );
        Ok(content)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/models", self.config.base_url.trim_end_matches('/'));
        let mut req = self
            .client
            .get(&url)
            .header("anthropic-version", &self.config.api_version)
            .timeout(Duration::from_secs(5));
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
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
