use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};
use tradekit_models::agent::{AgentDefinition, AnalysisState};
use tradekit_models::decision::{AgentAnalysis, Recommendation};
use tradekit_tools::ToolRegistry;

use crate::error::AgentError;
use crate::model::LanguageModel;
use crate::parser::{has_brace_block, parse_reply};
use crate::prompts::tool_agent_prompt;
use crate::toolbox::AgentToolbox;

/// A user-defined agent: one model, one system prompt, a fixed tool list.
pub struct ToolAgent {
    definition: AgentDefinition,
    toolbox: AgentToolbox,
    model: Arc<dyn LanguageModel>,
}

/// Fields read from the model's reply. Anything else is ignored.
#[derive(Debug, Deserialize)]
struct AnalysisReply {
    #[serde(default = "hold")]
    recommendation: Recommendation,
    #[serde(default)]
    confidence: Decimal,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    suggested_allocation: Decimal,
    #[serde(default)]
    tool_results: Value,
}

fn hold() -> Recommendation {
    Recommendation::Hold
}

impl ToolAgent {
    pub fn new(
        definition: AgentDefinition,
        registry: Arc<ToolRegistry>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let toolbox = AgentToolbox::new(&definition.name, definition.tools.clone(), registry);
        Self {
            definition,
            toolbox,
            model,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn toolbox(&self) -> &AgentToolbox {
        &self.toolbox
    }

    /// Analyze the state. Never fails: model or parse errors become a zero-confidence hold.
    pub async fn analyze(&self, state: &AnalysisState) -> AgentAnalysis {
        info!(agent = %self.name(), model = %self.model.id(), "Agent analyzing with tools");

        let tool_results = self.run_context_tools().await;
        match self.try_analyze(state, &tool_results).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(agent = %self.name(), error = %e, "Agent analysis failed");
                self.analysis(
                    Recommendation::Hold,
                    Decimal::ZERO,
                    format!("Error during analysis: {e}"),
                    Decimal::ZERO,
                    tool_results,
                )
            }
        }
    }

    async fn try_analyze(
        &self,
        state: &AnalysisState,
        tool_results: &Value,
    ) -> Result<AgentAnalysis, AgentError> {
        let prompt = tool_agent_prompt(&self.toolbox.format_tools_for_prompt(), state, tool_results);
        let system_prompt = self.definition.effective_system_prompt();
        let raw = self.model.complete(&system_prompt, &prompt).await?;

        if !has_brace_block(&raw) {
            return Ok(self.analysis(
                Recommendation::Hold,
                Decimal::new(5, 1),
                raw,
                Decimal::ZERO,
                tool_results.clone(),
            ));
        }

        let reply: AnalysisReply = parse_reply(&raw)?;
        let reported = if reply.tool_results.is_null() {
            tool_results.clone()
        } else {
            reply.tool_results
        };
        Ok(self.analysis(
            reply.recommendation,
            reply.confidence,
            reply.reasoning,
            reply.suggested_allocation,
            reported,
        ))
    }

    /// Run every listed tool that is read-only and needs no arguments.
    /// Failures are logged and left out.
    async fn run_context_tools(&self) -> Value {
        let mut results = Map::new();
        let runnable: Vec<String> = self
            .toolbox
            .tools()
            .filter(|t| t.enabled && t.kind.is_read_only() && t.required_parameters().next().is_none())
            .map(|t| t.name.clone())
            .collect();

        for name in runnable {
            match self.toolbox.execute(&name, &Map::new()).await {
                Ok(result) => {
                    results.insert(name, result);
                }
                Err(e) => warn!(agent = %self.name(), tool = %name, error = %e, "Error using tool"),
            }
        }

        Value::Object(results)
    }

    fn analysis(
        &self,
        recommendation: Recommendation,
        confidence: Decimal,
        reasoning: String,
        suggested_allocation: Decimal,
        tool_results: Value,
    ) -> AgentAnalysis {
        AgentAnalysis {
            agent: self.definition.name.clone(),
            description: self.definition.description.clone(),
            recommendation,
            confidence,
            reasoning,
            suggested_allocation,
            tool_results,
        }
    }
}
