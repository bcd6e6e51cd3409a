use thiserror::Error;
use tradekit_tools::ToolError;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model configuration error: {0}")]
    Config(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("Agent timed out after {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Tool {tool} not available to {agent}")]
    ToolNotAvailable { tool: String, agent: String },

    #[error("Agent {0} not found")]
    NotFound(String),

    #[error("Agent store error: {0}")]
    Store(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
