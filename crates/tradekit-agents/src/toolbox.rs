use std::sync::Arc;

use serde_json::{Map, Value};
use tradekit_models::tool::{Tool, ToolSchema};
use tradekit_tools::ToolRegistry;

use crate::error::AgentError;

/// The slice of the registry one agent may use.
#[derive(Clone)]
pub struct AgentToolbox {
    agent: String,
    tool_names: Vec<String>,
    registry: Arc<ToolRegistry>,
}

impl AgentToolbox {
    pub fn new(agent: &str, tool_names: Vec<String>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            agent: agent.to_string(),
            tool_names,
            registry,
        }
    }

    pub fn tool_names(&self) -> &[String] {
        &self.tool_names
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tool_names.iter().any(|t| t == name)
    }

    /// Listed tools still present in the registry, in list order.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tool_names
            .iter()
            .filter_map(|name| self.registry.lookup(name))
    }

    /// Run a tool from this agent's list through the registry.
    pub async fn execute(&self, name: &str, args: &Map<String, Value>) -> Result<Value, AgentError> {
        if !self.has_tool(name) {
            return Err(AgentError::ToolNotAvailable {
                tool: name.to_string(),
                agent: self.agent.clone(),
            });
        }
        Ok(self.registry.execute(name, args).await?)
    }

    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools().map(Tool::schema).collect()
    }

    /// One line per known tool: `- name(p: type, ..): description`.
    pub fn format_tools_for_prompt(&self) -> String {
        if self.tool_names.is_empty() {
            return "No tools available.".to_string();
        }

        let lines: Vec<String> = self
            .tools()
            .map(|tool| {
                let params: Vec<String> = tool
                    .parameters
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.param_type))
                    .collect();
                format!("- {}({}): {}", tool.name, params.join(", "), tool.description)
            })
            .collect();

        format!("Available tools:\n{}", lines.join("\n"))
    }
}
