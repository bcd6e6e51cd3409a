use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;
use tradekit_models::tool::{Tool, ToolSchema};

use crate::error::ApiError;
use crate::SharedContext;

#[derive(Debug, Deserialize)]
pub struct ExecuteToolRequest {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

pub async fn list_tools(State(ctx): State<SharedContext>) -> Json<Vec<Tool>> {
    Json(ctx.registry.all().to_vec())
}

pub async fn tools_by_category(
    State(ctx): State<SharedContext>,
) -> Json<BTreeMap<String, Vec<Tool>>> {
    let grouped = ctx
        .registry
        .categories()
        .into_iter()
        .map(|(category, tools)| {
            (
                category.to_string(),
                tools.into_iter().cloned().collect::<Vec<_>>(),
            )
        })
        .collect();
    Json(grouped)
}

pub async fn execute_tool(
    State(ctx): State<SharedContext>,
    Json(request): Json<ExecuteToolRequest>,
) -> Result<Json<Value>, ApiError> {
    info!(tool = %request.tool_name, "Tool execution requested");
    let result = ctx
        .registry
        .execute(&request.tool_name, &request.parameters)
        .await?;
    Ok(Json(json!({ "success": true, "result": result })))
}

pub async fn tool_schema(
    State(ctx): State<SharedContext>,
    Path(tool_name): Path<String>,
) -> Result<Json<ToolSchema>, ApiError> {
    ctx.registry
        .schema(&tool_name)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Tool {tool_name} not found")))
}
