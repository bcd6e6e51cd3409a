use thiserror::Error;
use tradekit_broker::BrokerError;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool {0} not found")]
    NotFound(String),

    #[error("Tool {0} is disabled")]
    Disabled(String),

    #[error("Required parameter '{parameter}' missing for tool {tool}")]
    MissingParameter { tool: String, parameter: String },

    #[error("Parameter '{parameter}' for tool {tool} is invalid: {reason}")]
    InvalidParameter {
        tool: String,
        parameter: String,
        reason: String,
    },

    #[error("Error executing tool {tool}: {source}")]
    Execution {
        tool: String,
        #[source]
        source: BrokerError,
    },
}

impl ToolError {
    /// True for failures raised before the tool ran (lookup and argument checks).
    pub fn is_validation(&self) -> bool {
        !matches!(self, ToolError::Execution { .. })
    }
}
