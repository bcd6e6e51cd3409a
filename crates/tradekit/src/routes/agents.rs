use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use tradekit_agents::{PortfolioManager, ToolAgent};
use tradekit_models::agent::{AgentDefinition, AnalysisState, PortfolioRequest};

use crate::error::ApiError;
use crate::SharedContext;

/// Public view of a stored agent.
#[derive(Debug, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub description: String,
    pub model: String,
    pub tools: Vec<String>,
}

impl From<AgentDefinition> for AgentSummary {
    fn from(def: AgentDefinition) -> Self {
        Self {
            name: def.name,
            description: def.description,
            model: def.model,
            tools: def.tools,
        }
    }
}

/// Every referenced tool must exist before the agent is stored.
pub async fn create_agent(
    State(ctx): State<SharedContext>,
    Json(definition): Json<AgentDefinition>,
) -> Result<Json<Value>, ApiError> {
    if let Some(unknown) = definition
        .tools
        .iter()
        .find(|name| !ctx.registry.contains(name))
    {
        return Err(ApiError::bad_request(format!("Tool {unknown} not found")));
    }

    ctx.agents.insert(definition.clone())?;
    Ok(Json(json!({
        "success": true,
        "agent": AgentSummary::from(definition),
    })))
}

pub async fn list_agents(
    State(ctx): State<SharedContext>,
) -> Result<Json<Vec<AgentSummary>>, ApiError> {
    let agents = ctx.agents.list()?;
    Ok(Json(agents.into_iter().map(AgentSummary::from).collect()))
}

pub async fn analyze_with_agent(
    State(ctx): State<SharedContext>,
    Path(name): Path<String>,
    Json(state): Json<AnalysisState>,
) -> Result<Json<Value>, ApiError> {
    let definition = ctx.agents.get(&name)?;
    let model = ctx.models.model(&definition.model)?;
    let agent = ToolAgent::new(definition, ctx.registry.clone(), model);

    let analysis = agent.analyze(&state).await;
    Ok(Json(json!({ "success": true, "analysis": analysis })))
}

pub async fn delete_agent(
    State(ctx): State<SharedContext>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ctx.agents.remove(&name)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Agent {name} deleted"),
    })))
}

/// Run the tool-enabled portfolio manager on the configured default model.
pub async fn portfolio_decisions(
    State(ctx): State<SharedContext>,
    Json(request): Json<PortfolioRequest>,
) -> Result<Json<Value>, ApiError> {
    let model = ctx.models.model(&ctx.config.llm.default_model)?;
    let manager = PortfolioManager::new(ctx.registry.clone(), model, &request.tools);

    info!(tickers = request.tickers.len(), "Portfolio decisions requested");
    let output = manager.decide(&request).await;
    Ok(Json(json!({ "success": true, "decisions": output.decisions })))
}
