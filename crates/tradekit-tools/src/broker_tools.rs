//! The brokerage tool catalog and its executor.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};
use tradekit_broker::{BrokerError, Brokerage};
use tradekit_models::brokerage::{AgentPortfolio, OrderRequest};
use tradekit_models::tool::{ParamType, Tool, ToolKind, ToolParameter};

use crate::operation::ToolOperation;
use crate::registry::{ToolExecutor, ToolRegistry};

pub const CATEGORY_ACCOUNT: &str = "alpaca_account";
pub const CATEGORY_PORTFOLIO: &str = "alpaca_portfolio";
pub const CATEGORY_TRADING: &str = "alpaca_trading";
pub const CATEGORY_MARKET_DATA: &str = "alpaca_market_data";

/// Every brokerage tool, in registration order.
pub fn broker_tool_catalog() -> Vec<Tool> {
    vec![
        Tool::new(
            "get_account",
            "Get Alpaca account information including cash, buying power, and portfolio value",
            ToolKind::GetAccount,
            CATEGORY_ACCOUNT,
        ),
        Tool::new(
            "get_positions",
            "Get current positions in the Alpaca account",
            ToolKind::GetPositions,
            CATEGORY_PORTFOLIO,
        )
        .with_parameters(vec![ToolParameter::optional(
            "symbols",
            ParamType::Array,
            "Optional list of symbols to filter positions",
            Value::Null,
        )]),
        Tool::new(
            "get_portfolio_history",
            "Get portfolio performance history",
            ToolKind::GetPortfolioHistory,
            CATEGORY_PORTFOLIO,
        )
        .with_parameters(vec![
            ToolParameter::optional(
                "period",
                ParamType::String,
                "Time period (1D, 1W, 1M, 3M, 1A)",
                json!("1M"),
            ),
            ToolParameter::optional(
                "timeframe",
                ParamType::String,
                "Timeframe (1Min, 5Min, 15Min, 1H, 1D)",
                json!("1D"),
            ),
        ]),
        Tool::new(
            "place_market_order",
            "Place a market order",
            ToolKind::PlaceMarketOrder,
            CATEGORY_TRADING,
        )
        .with_parameters(vec![
            ToolParameter::required("symbol", ParamType::String, "Stock symbol"),
            ToolParameter::required("qty", ParamType::Number, "Quantity of shares"),
            ToolParameter::optional("side", ParamType::String, "Order side (buy or sell)", json!("buy")),
        ]),
        Tool::new(
            "place_limit_order",
            "Place a limit order",
            ToolKind::PlaceLimitOrder,
            CATEGORY_TRADING,
        )
        .with_parameters(vec![
            ToolParameter::required("symbol", ParamType::String, "Stock symbol"),
            ToolParameter::required("qty", ParamType::Number, "Quantity of shares"),
            ToolParameter::required("limit_price", ParamType::Number, "Limit price"),
            ToolParameter::optional("side", ParamType::String, "Order side (buy or sell)", json!("buy")),
        ]),
        Tool::new(
            "get_orders",
            "Get orders from the Alpaca account",
            ToolKind::GetOrders,
            CATEGORY_TRADING,
        )
        .with_parameters(vec![
            ToolParameter::optional(
                "status",
                ParamType::String,
                "Order status filter (open, closed, all)",
                json!("open"),
            ),
            ToolParameter::optional(
                "limit",
                ParamType::Integer,
                "Maximum number of orders to return",
                json!(50),
            ),
        ]),
        Tool::new(
            "cancel_order",
            "Cancel an order",
            ToolKind::CancelOrder,
            CATEGORY_TRADING,
        )
        .with_parameters(vec![ToolParameter::required(
            "order_id",
            ParamType::String,
            "Order ID to cancel",
        )]),
        Tool::new(
            "get_bars",
            "Get historical price bars for a symbol",
            ToolKind::GetBars,
            CATEGORY_MARKET_DATA,
        )
        .with_parameters(vec![
            ToolParameter::required("symbol", ParamType::String, "Stock symbol"),
            ToolParameter::required("start_date", ParamType::String, "Start date (YYYY-MM-DD)"),
            ToolParameter::required("end_date", ParamType::String, "End date (YYYY-MM-DD)"),
            ToolParameter::optional(
                "timeframe",
                ParamType::String,
                "Bar timeframe (1Min, 1Hour, 1Day)",
                json!("1Day"),
            ),
        ]),
        Tool::new(
            "get_latest_quote",
            "Get the latest quote for a symbol",
            ToolKind::GetLatestQuote,
            CATEGORY_MARKET_DATA,
        )
        .with_parameters(vec![ToolParameter::required(
            "symbol",
            ParamType::String,
            "Stock symbol",
        )]),
        Tool::new(
            "get_clock",
            "Get market clock information",
            ToolKind::GetClock,
            CATEGORY_MARKET_DATA,
        ),
        Tool::new(
            "get_portfolio_for_agents",
            "Get portfolio data formatted for the trading agents",
            ToolKind::GetPortfolioForAgents,
            CATEGORY_PORTFOLIO,
        )
        .with_parameters(vec![ToolParameter::required(
            "tickers",
            ParamType::Array,
            "List of tickers to include in the portfolio",
        )]),
    ]
}

pub fn register_broker_tools(registry: &mut ToolRegistry) {
    for tool in broker_tool_catalog() {
        registry.register(tool);
    }
}

/// Executes tool operations against a [`Brokerage`].
pub struct BrokerToolset {
    broker: Arc<dyn Brokerage>,
}

impl BrokerToolset {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }

    async fn portfolio_for_agents(&self, tickers: &[String]) -> Value {
        let account = match self.broker.account().await {
            Ok(account) => account,
            Err(e) => {
                warn!(error = %e, "Account unavailable; returning empty agent portfolio");
                return json!({});
            }
        };
        let positions = self.broker.positions().await.unwrap_or_else(|e| {
            warn!(error = %e, "Positions unavailable; treating portfolio as flat");
            Vec::new()
        });
        to_json(&AgentPortfolio::from_broker(&account, &positions, tickers))
    }
}

#[async_trait]
impl ToolExecutor for BrokerToolset {
    async fn execute(&self, operation: ToolOperation) -> Result<Value, BrokerError> {
        debug!(operation = ?operation, "Dispatching brokerage operation");
        let result = match operation {
            ToolOperation::GetAccount => to_json(&self.broker.account().await?),
            ToolOperation::GetPositions { symbols } => {
                let mut positions = self.broker.positions().await?;
                if let Some(symbols) = symbols {
                    positions.retain(|p| symbols.iter().any(|s| s == &p.symbol));
                }
                to_json(&positions)
            }
            ToolOperation::GetPortfolioHistory { period, timeframe } => {
                to_json(&self.broker.portfolio_history(&period, &timeframe).await?)
            }
            ToolOperation::PlaceMarketOrder { symbol, qty, side } => {
                let request = OrderRequest::market(&symbol, qty, side);
                to_json(&self.broker.submit_order(&request).await?)
            }
            ToolOperation::PlaceLimitOrder {
                symbol,
                qty,
                limit_price,
                side,
            } => {
                let request = OrderRequest::limit(&symbol, qty, limit_price, side);
                to_json(&self.broker.submit_order(&request).await?)
            }
            ToolOperation::GetOrders { status, limit } => {
                to_json(&self.broker.orders(status, limit).await?)
            }
            ToolOperation::CancelOrder { order_id } => {
                self.broker.cancel_order(order_id).await?;
                json!({
                    "status": "success",
                    "message": format!("Order {order_id} cancelled"),
                })
            }
            ToolOperation::GetBars {
                symbol,
                start,
                end,
                timeframe,
            } => to_json(&self.broker.bars(&symbol, timeframe, start, end).await?),
            ToolOperation::GetLatestQuote { symbol } => {
                match self.broker.latest_quote(&symbol).await? {
                    Some(quote) => to_json(&quote),
                    None => json!({
                        "symbol": symbol,
                        "error": "No quote data available",
                    }),
                }
            }
            ToolOperation::GetClock => to_json(&self.broker.clock().await?),
            ToolOperation::GetPortfolioForAgents { tickers } => {
                self.portfolio_for_agents(&tickers).await
            }
        };
        Ok(result)
    }
}

/// Model records always serialize; a failure here yields `null`.
fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
