use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use tradekit_models::config::LlmConfig;

use crate::claude_cli::{ClaudeCli, ClaudeCliConfig};
use crate::error::AgentError;
use crate::openai::{OpenAiChat, OPENAI_API_KEY_ENV};

/// A chat model that turns a system prompt and a user prompt into text. Mockable for testing.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn id(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError>;
}

/// Resolves a model identifier to a provider.
pub trait ModelProvider: Send + Sync {
    fn model(&self, model_id: &str) -> Result<Arc<dyn LanguageModel>, AgentError>;
}

/// Picks the `claude` CLI for `claude*` identifiers and the OpenAI-compatible
/// API for everything else.
pub struct ModelFactory {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    cli_timeout: Duration,
}

impl ModelFactory {
    pub fn new(config: &LlmConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        let api_key = config
            .openai_api_key
            .clone()
            .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            http,
            endpoint: config.openai_endpoint.clone(),
            api_key,
            cli_timeout: Duration::from_secs(config.cli_timeout_seconds),
        })
    }
}

pub fn uses_claude_cli(model_id: &str) -> bool {
    model_id.starts_with("claude")
}

impl ModelProvider for ModelFactory {
    fn model(&self, model_id: &str) -> Result<Arc<dyn LanguageModel>, AgentError> {
        if uses_claude_cli(model_id) {
            debug!(model = %model_id, "Using claude CLI provider");
            return Ok(Arc::new(ClaudeCli::new(ClaudeCliConfig {
                model: model_id.to_string(),
                timeout: self.cli_timeout,
            })));
        }

        debug!(model = %model_id, "Using OpenAI-compatible provider");
        Ok(Arc::new(OpenAiChat::new(
            self.http.clone(),
            &self.endpoint,
            self.api_key.clone(),
            model_id,
        )))
    }
}
