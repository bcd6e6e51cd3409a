//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::model::LanguageModel;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Any endpoint speaking the `/v1/chat/completions` shape.
///
/// A missing API key is not an error until the first call.
pub struct OpenAiChat {
    http: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiChat {
    pub fn new(http: Client, endpoint: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            http,
            url: format!("{}{}", endpoint.trim_end_matches('/'), CHAT_COMPLETIONS_PATH),
            api_key,
            model: model.to_string(),
        }
    }

    fn require_api_key(&self) -> Result<&str, AgentError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AgentError::Config(format!("{OPENAI_API_KEY_ENV} is not set for model {}", self.model))
            })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    fn id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError> {
        let api_key = self.require_api_key()?;
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream: false,
        };

        info!(model = %self.model, "Sending chat completion request");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .inspect_err(|e| warn!(model = %self.model, error = %e, "Chat completion failed"))?;

        let reply: ChatResponse = response.json().await?;
        debug!(model = %self.model, "Received chat completion");

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AgentError::Parse("chat completion had no content".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}
