//! Provider dispatcher.
//!
//! Routes assembled completion requests to the backend registered for a
//! persona's provider identifier. Credentials are an explicit configuration
//! object injected at construction, never read per call. Missing
//! credentials or a failing backend degrade to the offline placeholder so a
//! turn can always complete; the degradation is logged, never silent.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use plenum_core::{defaults, ChatBackend, CompletionRequest, Result};

use crate::anthropic::{AnthropicStyleBackend, AnthropicStyleConfig};
use crate::offline::OfflineBackend;
use crate::openai::{OpenAIStyleBackend, OpenAIStyleConfig};

/// Credentials for one provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    /// API key; `None` leaves the provider in offline placeholder mode.
    pub api_key: Option<String>,
    /// Base URL override; `None` uses the provider's default endpoint.
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    fn configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Injected dispatcher configuration covering every known provider.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    pub openai: ProviderCredentials,
    pub anthropic: ProviderCredentials,
    pub deepseek: ProviderCredentials,
}

impl DispatcherConfig {
    /// Build dispatcher configuration from environment variables:
    /// `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `DEEPSEEK_API_KEY` and their
    /// `*_BASE_URL` overrides.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let read = |key_var: &str, url_var: &str| ProviderCredentials {
            api_key: std::env::var(key_var).ok().filter(|k| !k.is_empty()),
            base_url: std::env::var(url_var).ok().filter(|u| !u.is_empty()),
        };

        Self {
            openai: read("OPENAI_API_KEY", "OPENAI_BASE_URL"),
            anthropic: read("ANTHROPIC_API_KEY", "ANTHROPIC_BASE_URL"),
            deepseek: read("DEEPSEEK_API_KEY", "DEEPSEEK_BASE_URL"),
        }
    }
}

/// Routes completion requests to per-provider chat backends.
pub struct ProviderDispatcher {
    backends: HashMap<String, Arc<dyn ChatBackend>>,
}

impl ProviderDispatcher {
    /// Build a dispatcher from injected credentials. Providers without
    /// credentials are registered as offline placeholders.
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        let mut dispatcher = Self {
            backends: HashMap::new(),
        };

        if config.openai.configured() {
            dispatcher.register(Arc::new(OpenAIStyleBackend::new(OpenAIStyleConfig {
                provider_id: "openai".to_string(),
                base_url: config
                    .openai
                    .base_url
                    .clone()
                    .unwrap_or_else(|| defaults::OPENAI_URL.to_string()),
                api_key: config.openai.api_key.clone(),
                timeout_seconds: defaults::GEN_TIMEOUT_SECS,
            })?));
        } else {
            dispatcher.register(Arc::new(OfflineBackend::new("openai")));
        }

        if config.anthropic.configured() {
            dispatcher.register(Arc::new(AnthropicStyleBackend::new(
                AnthropicStyleConfig {
                    base_url: config
                        .anthropic
                        .base_url
                        .clone()
                        .unwrap_or_else(|| defaults::ANTHROPIC_URL.to_string()),
                    api_key: config.anthropic.api_key.clone(),
                    ..AnthropicStyleConfig::default()
                },
            )?));
        } else {
            dispatcher.register(Arc::new(OfflineBackend::new("anthropic")));
        }

        if config.deepseek.configured() {
            let mut deepseek = OpenAIStyleConfig::deepseek(config.deepseek.api_key.clone());
            if let Some(base_url) = config.deepseek.base_url.clone() {
                deepseek.base_url = base_url;
            }
            dispatcher.register(Arc::new(OpenAIStyleBackend::new(deepseek)?));
        } else {
            dispatcher.register(Arc::new(OfflineBackend::new("deepseek")));
        }

        info!(
            providers = ?dispatcher.provider_ids(),
            "Provider dispatcher initialized"
        );
        Ok(dispatcher)
    }

    /// Register (or replace) a backend under its provider id.
    pub fn register(&mut self, backend: Arc<dyn ChatBackend>) {
        self.backends
            .insert(backend.provider_id().to_string(), backend);
    }

    /// All registered provider ids.
    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.backends.keys().map(|s| s.as_str()).collect();
        ids.sort();
        ids
    }

    /// Whether a provider id is registered.
    pub fn has_provider(&self, provider_id: &str) -> bool {
        self.backends.contains_key(provider_id)
    }

    /// Dispatch a completion to the backend for `provider_id`.
    ///
    /// An unknown provider or a failing backend degrades to the offline
    /// placeholder so the discourse can continue; both paths are logged.
    pub async fn dispatch(&self, provider_id: &str, req: &CompletionRequest) -> Result<String> {
        match self.backends.get(provider_id) {
            Some(backend) => match backend.complete(req).await {
                Ok(text) => Ok(text),
                Err(e) => {
                    warn!(
                        provider = provider_id,
                        model = %req.model,
                        error = %e,
                        "Provider unavailable; degrading to offline placeholder"
                    );
                    OfflineBackend::new(provider_id).complete(req).await
                }
            },
            None => {
                warn!(
                    provider = provider_id,
                    "Unknown provider; degrading to offline placeholder"
                );
                OfflineBackend::new(provider_id).complete(req).await
            }
        }
    }
}
