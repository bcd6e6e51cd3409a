use serde::{Deserialize, Serialize};

/// Top-level configuration for tradekit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TradekitConfig {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub llm: LlmConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Brokerage connection settings. Credentials come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    /// Route trading calls to the paper-trading endpoint.
    pub paper: bool,
    /// Override for the trading API base URL.
    pub trading_url: Option<String>,
    /// Override for the market data API base URL.
    pub data_url: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            paper: true,
            trading_url: None,
            data_url: None,
            request_timeout_seconds: 30,
        }
    }
}

/// Language model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Model used by the portfolio manager and agents created without one.
    pub default_model: String,
    /// Base URL of the OpenAI-compatible chat completions API.
    pub openai_endpoint: String,
    /// API key for the OpenAI-compatible API. Falls back to `OPENAI_API_KEY`.
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    /// Timeout for a single `claude` CLI invocation.
    pub cli_timeout_seconds: u64,
    /// Timeout for a single HTTP completion request.
    pub request_timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: crate::agent::DEFAULT_AGENT_MODEL.to_string(),
            openai_endpoint: "https://api.openai.com".to_string(),
            openai_api_key: None,
            cli_timeout_seconds: 45,
            request_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Report tool execution failures as `{"error": ...}` results instead of errors.
    pub error_payloads: bool,
}
