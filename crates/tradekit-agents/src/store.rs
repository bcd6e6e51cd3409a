use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::info;
use tradekit_models::agent::AgentDefinition;

use crate::error::AgentError;

/// In-process custom agent definitions keyed by name. Lost on restart.
#[derive(Debug, Default)]
pub struct AgentStore {
    agents: RwLock<BTreeMap<String, AgentDefinition>>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the definition it replaced, if any.
    pub fn insert(&self, definition: AgentDefinition) -> Result<Option<AgentDefinition>, AgentError> {
        let mut agents = self.agents.write().map_err(|e| AgentError::Store(e.to_string()))?;
        info!(agent = %definition.name, tools = definition.tools.len(), "Storing custom agent");
        Ok(agents.insert(definition.name.clone(), definition))
    }

    pub fn get(&self, name: &str) -> Result<AgentDefinition, AgentError> {
        let agents = self.agents.read().map_err(|e| AgentError::Store(e.to_string()))?;
        agents
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(name.to_string()))
    }

    /// All definitions, sorted by name.
    pub fn list(&self) -> Result<Vec<AgentDefinition>, AgentError> {
        let agents = self.agents.read().map_err(|e| AgentError::Store(e.to_string()))?;
        Ok(agents.values().cloned().collect())
    }

    pub fn remove(&self, name: &str) -> Result<AgentDefinition, AgentError> {
        let mut agents = self.agents.write().map_err(|e| AgentError::Store(e.to_string()))?;
        let removed = agents
            .remove(name)
            .ok_or_else(|| AgentError::NotFound(name.to_string()))?;
        info!(agent = %name, "Removed custom agent");
        Ok(removed)
    }
}
