use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tradekit_agents::AgentError;
use tradekit_tools::ToolError;

/// An HTTP failure. Renders as `{"detail": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Validation failures are 404, execution failures 500.
impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        if err.is_validation() {
            Self::not_found(err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::NotFound(_) => Self::not_found(err.to_string()),
            AgentError::Tool(tool) => tool.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_errors_map_by_kind() {
        let missing = ApiError::from(ToolError::MissingParameter {
            tool: "get_bars".to_string(),
            parameter: "symbol".to_string(),
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let failed = ApiError::from(ToolError::Execution {
            tool: "get_account".to_string(),
            source: tradekit_broker::BrokerError::Config("no keys".to_string()),
        });
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_agent_is_not_found() {
        let err = ApiError::from(AgentError::NotFound("scout".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.detail, "Agent scout not found");
    }
}
