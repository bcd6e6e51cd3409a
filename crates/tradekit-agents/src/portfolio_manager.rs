//! Tool-enabled portfolio manager: live brokerage context plus analyst
//! signals in, one decision per ticker out.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use tradekit_models::agent::{PortfolioRequest, SignalEntry, RISK_MANAGEMENT_AGENT};
use tradekit_models::brokerage::Quote;
use tradekit_models::decision::{PortfolioDecision, PortfolioDecisions};
use tradekit_tools::ToolRegistry;

use crate::error::AgentError;
use crate::model::LanguageModel;
use crate::parser::{has_brace_block, parse_reply};
use crate::prompts::{portfolio_manager_prompt, portfolio_manager_system_prompt, DecisionInputs};
use crate::toolbox::AgentToolbox;

pub const PORTFOLIO_MANAGER_NAME: &str = "Tool-Enabled Portfolio Manager";

/// Signals from this analyst carry limits, not views, and are left out of the prompt.
pub const RISK_AGENT: &str = RISK_MANAGEMENT_AGENT;

pub const DEFAULT_TOOLS: [&str; 5] = [
    "get_account",
    "get_positions",
    "get_portfolio_history",
    "get_latest_quote",
    "get_clock",
];

/// Whole shares affordable under the limit. Zero when the price is not positive.
pub fn max_shares(remaining_position_limit: Decimal, price: Decimal) -> u64 {
    if price <= Decimal::ZERO || remaining_position_limit <= Decimal::ZERO {
        return 0;
    }
    (remaining_position_limit / price)
        .floor()
        .to_u64()
        .unwrap_or(0)
}

pub struct PortfolioManager {
    toolbox: AgentToolbox,
    model: Arc<dyn LanguageModel>,
}

#[derive(Debug, Deserialize)]
struct DecisionReply {
    #[serde(default)]
    decisions: BTreeMap<String, PortfolioDecision>,
}

/// Live context gathered through the toolbox before prompting.
#[derive(Debug, Default)]
struct ToolData {
    fields: Map<String, Value>,
    quotes: BTreeMap<String, Quote>,
}

impl PortfolioManager {
    /// The default tool set plus `extra_tools`, without duplicates.
    pub fn new(
        registry: Arc<ToolRegistry>,
        model: Arc<dyn LanguageModel>,
        extra_tools: &[String],
    ) -> Self {
        let mut tools: Vec<String> = DEFAULT_TOOLS.iter().map(|t| t.to_string()).collect();
        for extra in extra_tools {
            if !tools.contains(extra) {
                tools.push(extra.clone());
            }
        }
        info!(tools = tools.len(), "Portfolio manager initialized");

        Self {
            toolbox: AgentToolbox::new(PORTFOLIO_MANAGER_NAME, tools, registry),
            model,
        }
    }

    pub fn toolbox(&self) -> &AgentToolbox {
        &self.toolbox
    }

    /// Decide for every requested ticker. Never fails: any error becomes an all-hold.
    pub async fn decide(&self, request: &PortfolioRequest) -> PortfolioDecisions {
        let tool_data = self.gather_tool_data(&request.tickers).await;

        match self.try_decide(request, &tool_data).await {
            Ok(decisions) => decisions,
            Err(e) => {
                warn!(error = %e, "Error generating trading decision");
                PortfolioDecisions::all_hold(
                    &request.tickers,
                    &format!("Error in decision generation: {e}"),
                )
            }
        }
    }

    async fn try_decide(
        &self,
        request: &PortfolioRequest,
        tool_data: &ToolData,
    ) -> Result<PortfolioDecisions, AgentError> {
        let mut current_prices = Map::new();
        let mut shares = Map::new();
        let mut signals_by_ticker = Map::new();

        for ticker in &request.tickers {
            let risk = request.risk_for(ticker);
            let price = tool_data
                .quotes
                .get(ticker)
                .and_then(Quote::mid_price)
                .unwrap_or(risk.current_price);

            current_prices.insert(ticker.clone(), json!(price));
            shares.insert(
                ticker.clone(),
                json!(max_shares(risk.remaining_position_limit, price)),
            );

            let signals: Map<String, Value> = request
                .analyst_signals
                .iter()
                .filter(|(agent, _)| agent.as_str() != RISK_AGENT)
                .filter_map(|(agent, by_ticker)| {
                    by_ticker
                        .get(ticker)
                        .and_then(SignalEntry::as_signal)
                        .map(|s| (agent.clone(), json!({"signal": s.signal, "confidence": s.confidence})))
                })
                .collect();
            signals_by_ticker.insert(ticker.clone(), Value::Object(signals));
        }

        let tool_json = Value::Object(tool_data.fields.clone());
        let prompt = portfolio_manager_prompt(&DecisionInputs {
            signals_by_ticker: &Value::Object(signals_by_ticker),
            current_prices: &Value::Object(current_prices),
            max_shares: &Value::Object(shares),
            portfolio_cash: format!("{:.2}", request.portfolio.cash),
            portfolio_positions: &request.portfolio.positions,
            margin_requirement: format!("{:.2}", request.portfolio.margin_requirement),
            margin_used: format!("{:.2}", request.portfolio.margin_used),
            tool_data: &tool_json,
        });

        info!(tickers = request.tickers.len(), model = %self.model.id(), "Generating trading decisions");
        let raw = self
            .model
            .complete(&portfolio_manager_system_prompt(), &prompt)
            .await?;

        if !has_brace_block(&raw) {
            return Ok(PortfolioDecisions::all_hold(&request.tickers, &raw));
        }

        let mut reply: DecisionReply = parse_reply(&raw)?;
        let decisions = request
            .tickers
            .iter()
            .map(|ticker| {
                let decision = reply.decisions.remove(ticker).unwrap_or_else(|| {
                    warn!(ticker = %ticker, "No decision returned for ticker");
                    PortfolioDecision::hold("No decision returned for ticker")
                });
                (ticker.clone(), decision)
            })
            .collect();

        Ok(PortfolioDecisions { decisions })
    }

    /// Each lookup is independent; a failing tool is logged and left out.
    async fn gather_tool_data(&self, tickers: &[String]) -> ToolData {
        let mut data = ToolData::default();

        if self.toolbox.has_tool("get_account") {
            if let Some(account) = self.best_effort("get_account", Map::new()).await {
                data.fields.insert("account".to_string(), account);
            }
        }

        if self.toolbox.has_tool("get_positions") {
            let mut args = Map::new();
            args.insert("symbols".to_string(), json!(tickers));
            if let Some(positions) = self.best_effort("get_positions", args).await {
                data.fields.insert("positions".to_string(), positions);
            }
        }

        if self.toolbox.has_tool("get_latest_quote") {
            let mut quotes = Map::new();
            for ticker in tickers {
                let mut args = Map::new();
                args.insert("symbol".to_string(), json!(ticker));
                let Some(quote) = self.best_effort("get_latest_quote", args).await else {
                    continue;
                };
                if let Ok(parsed) = serde_json::from_value::<Quote>(quote.clone()) {
                    data.quotes.insert(ticker.clone(), parsed);
                }
                quotes.insert(ticker.clone(), quote);
            }
            data.fields.insert("quotes".to_string(), Value::Object(quotes));
        }

        if self.toolbox.has_tool("get_clock") {
            if let Some(clock) = self.best_effort("get_clock", Map::new()).await {
                data.fields.insert("market_clock".to_string(), clock);
            }
        }

        data
    }

    async fn best_effort(&self, tool: &str, args: Map<String, Value>) -> Option<Value> {
        match self.toolbox.execute(tool, &args).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(tool = %tool, error = %e, "Portfolio manager tool failed");
                None
            }
        }
    }
}
