pub mod agent;
pub mod brokerage;
pub mod config;
pub mod decision;
pub mod tool;

pub use agent::{
    AgentDefinition, AnalysisState, AnalystSignal, PortfolioRequest, PortfolioSnapshot, RiskLimits,
    SignalEntry,
};
pub use brokerage::{
    Account, AgentPortfolio, Bar, BarTimeframe, MarketClock, Order, OrderRequest, OrderSide,
    OrderStatusFilter, OrderType, PortfolioHistory, Position, PositionSide, Quote, RealizedGains,
    TickerPosition, TimeInForce,
};
pub use config::{BrokerConfig, LlmConfig, ServerConfig, ToolsConfig, TradekitConfig};
pub use decision::{AgentAnalysis, PortfolioDecision, PortfolioDecisions, Recommendation, TradeAction};
pub use tool::{
    ParamType, ParametersSchema, PropertySchema, Tool, ToolKind, ToolParameter, ToolSchema,
};
