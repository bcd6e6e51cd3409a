//! Scripted language models for exercising agents without a provider.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::AgentError;
use crate::model::{LanguageModel, ModelProvider};

/// Replies with fixed text, or fails, and records every prompt it was given.
pub struct ScriptedModel {
    pub id: String,
    pub reply: Result<String, String>,
    /// `(system_prompt, user_prompt)` per call.
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            id: "scripted".to_string(),
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            id: "scripted".to_string(),
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.prompts
            .lock()
            .ok()
            .and_then(|p| p.last().map(|(_, user)| user.clone()))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((system_prompt.to_string(), user_prompt.to_string()));
        }
        self.reply.clone().map_err(AgentError::Cli)
    }
}

/// Hands out the same model for every identifier and remembers what was asked for.
pub struct StaticModels {
    pub model: Arc<ScriptedModel>,
    pub requested: Mutex<Vec<String>>,
}

impl StaticModels {
    pub fn new(model: Arc<ScriptedModel>) -> Self {
        Self {
            model,
            requested: Mutex::new(Vec::new()),
        }
    }
}

impl ModelProvider for StaticModels {
    fn model(&self, model_id: &str) -> Result<Arc<dyn LanguageModel>, AgentError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(model_id.to_string());
        }
        Ok(self.model.clone())
    }
}

/// Registry over the in-memory brokerage with the full tool catalog.
#[cfg(test)]
pub(crate) fn broker_registry() -> Arc<tradekit_tools::ToolRegistry> {
    registry_over(tradekit_broker::test_support::MockBrokerage::new())
}

#[cfg(test)]
pub(crate) fn registry_over(
    broker: tradekit_broker::test_support::MockBrokerage,
) -> Arc<tradekit_tools::ToolRegistry> {
    let toolset = tradekit_tools::BrokerToolset::new(Arc::new(broker));
    let mut registry = tradekit_tools::ToolRegistry::new(Arc::new(toolset));
    tradekit_tools::register_broker_tools(&mut registry);
    Arc::new(registry)
}
