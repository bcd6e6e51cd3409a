//! Tradekit - brokerage tools and tool-using trading agents over HTTP.
//!
//! A registry of Alpaca brokerage tools, custom agents that may call a
//! chosen subset of them, and a tool-enabled portfolio manager.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use tradekit::models::config::TradekitConfig;
//! use tradekit::tools::{ToolRegistry, register_broker_tools};
//! use tradekit::agents::{ToolAgent, PortfolioManager};
//! ```

pub use tradekit_agents as agents;
pub use tradekit_broker as broker;
pub use tradekit_models as models;
pub use tradekit_tools as tools;

pub mod error;
pub mod routes;
pub mod server;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tradekit_agents::{AgentStore, ModelFactory, ModelProvider};
use tradekit_broker::{AlpacaClient, Brokerage};
use tradekit_models::config::{ToolsConfig, TradekitConfig};
use tradekit_tools::{register_broker_tools, BrokerToolset, ToolRegistry};

/// Everything a request handler needs. Shared as axum state.
pub struct AppContext {
    pub registry: Arc<ToolRegistry>,
    pub agents: AgentStore,
    pub models: Arc<dyn ModelProvider>,
    pub config: TradekitConfig,
}

pub type SharedContext = Arc<AppContext>;

impl AppContext {
    pub fn new(
        registry: Arc<ToolRegistry>,
        models: Arc<dyn ModelProvider>,
        config: TradekitConfig,
    ) -> Self {
        Self {
            registry,
            agents: AgentStore::new(),
            models,
            config,
        }
    }
}

/// Read configuration from TOML. A missing file means defaults.
pub fn load_config(path: &Path) -> anyhow::Result<TradekitConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found; using defaults");
        return Ok(TradekitConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Registry with the full brokerage catalog over `broker`.
pub fn build_registry(broker: Arc<dyn Brokerage>, tools: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new(Arc::new(BrokerToolset::new(broker)))
        .with_error_payloads(tools.error_payloads);
    register_broker_tools(&mut registry);
    info!(tools = registry.len(), "Brokerage tools registered");
    registry
}

/// Wire the Alpaca client, tool registry, and model providers from configuration.
pub fn build_context(config: TradekitConfig) -> anyhow::Result<AppContext> {
    let broker = AlpacaClient::from_config(&config.broker).context("Failed to build Alpaca client")?;
    let registry = build_registry(Arc::new(broker), &config.tools);
    let models = ModelFactory::new(&config.llm).context("Failed to build model providers")?;
    Ok(AppContext::new(Arc::new(registry), Arc::new(models), config))
}
