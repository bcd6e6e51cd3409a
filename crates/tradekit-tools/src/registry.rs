use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};
use tradekit_broker::BrokerError;
use tradekit_models::tool::{Tool, ToolSchema};

use crate::error::ToolError;
use crate::operation::ToolOperation;

/// Runs resolved operations. The registry owns exactly one executor.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, operation: ToolOperation) -> Result<Value, BrokerError>;
}

/// Name-indexed catalog of tools. Insertion order is preserved; registering
/// an existing name replaces it in place.
pub struct ToolRegistry {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
    executor: Arc<dyn ToolExecutor>,
    error_payloads: bool,
}

impl ToolRegistry {
    pub fn new(executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            executor,
            error_payloads: false,
        }
    }

    /// Return execution failures as `{"error": message}` results.
    pub fn with_error_payloads(mut self, enabled: bool) -> Self {
        self.error_payloads = enabled;
        self
    }

    pub fn register(&mut self, tool: Tool) {
        debug!(tool = %tool.name, category = %tool.category, "Registering tool");
        match self.index.get(&tool.name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(tool.name.clone(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn all(&self) -> &[Tool] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn by_category(&self, category: &str) -> Vec<&Tool> {
        self.tools.iter().filter(|t| t.category == category).collect()
    }

    /// Every tool grouped by category.
    pub fn categories(&self) -> BTreeMap<&str, Vec<&Tool>> {
        let mut grouped: BTreeMap<&str, Vec<&Tool>> = BTreeMap::new();
        for tool in &self.tools {
            grouped.entry(tool.category.as_str()).or_default().push(tool);
        }
        grouped
    }

    /// Function-calling schema, or `None` for an unknown tool.
    pub fn schema(&self, name: &str) -> Option<ToolSchema> {
        self.lookup(name).map(Tool::schema)
    }

    /// Validate arguments and run the tool.
    ///
    /// Checks run in order: existence, enabled flag, required parameters (in
    /// declaration order), then the declared type of each supplied argument.
    /// Unknown arguments are ignored.
    pub async fn execute(&self, name: &str, args: &Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self
            .lookup(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if !tool.enabled {
            return Err(ToolError::Disabled(name.to_string()));
        }

        let args = prepare_arguments(tool, args)?;
        let operation = ToolOperation::resolve(tool, &args)?;

        info!(tool = %name, "Executing tool");
        let start = Instant::now();
        match self.executor.execute(operation).await {
            Ok(result) => {
                info!(tool = %name, elapsed_ms = start.elapsed().as_millis(), "Tool executed successfully");
                Ok(result)
            }
            Err(e) => {
                error!(tool = %name, error = %e, elapsed_ms = start.elapsed().as_millis(), "Error executing tool");
                if self.error_payloads {
                    return Ok(json!({ "error": e.to_string() }));
                }
                Err(ToolError::Execution {
                    tool: name.to_string(),
                    source: e,
                })
            }
        }
    }
}

/// Check presence and declared types, then fill defaults for absent optional parameters.
fn prepare_arguments(
    tool: &Tool,
    args: &Map<String, Value>,
) -> Result<Map<String, Value>, ToolError> {
    if let Some(missing) = tool
        .required_parameters()
        .find(|p| !args.contains_key(&p.name))
    {
        return Err(ToolError::MissingParameter {
            tool: tool.name.clone(),
            parameter: missing.name.clone(),
        });
    }

    let mut prepared = args.clone();
    for param in &tool.parameters {
        match args.get(&param.name) {
            Some(Value::Null) if !param.required => {}
            Some(value) => {
                if !param.param_type.matches(value) {
                    return Err(ToolError::InvalidParameter {
                        tool: tool.name.clone(),
                        parameter: param.name.clone(),
                        reason: format!("expected {}", param.param_type),
                    });
                }
            }
            None => {
                if let Some(default) = &param.default {
                    prepared.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(prepared)
}
