use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Short,
    Cover,
    Hold,
}

/// A per-ticker trading decision from the portfolio manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioDecision {
    pub action: TradeAction,
    /// Number of shares to trade.
    pub quantity: u64,
    /// 0 to 100.
    pub confidence: Decimal,
    pub reasoning: String,
}

impl PortfolioDecision {
    /// A zero-quantity, zero-confidence hold.
    pub fn hold(reasoning: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            quantity: 0,
            confidence: Decimal::ZERO,
            reasoning: reasoning.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioDecisions {
    pub decisions: BTreeMap<String, PortfolioDecision>,
}

impl PortfolioDecisions {
    pub fn all_hold(tickers: &[String], reasoning: &str) -> Self {
        Self {
            decisions: tickers
                .iter()
                .map(|t| (t.clone(), PortfolioDecision::hold(reasoning)))
                .collect(),
        }
    }
}

/// Recommendation from a custom tool agent. Accepts any casing on input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    #[serde(alias = "buy", alias = "Buy")]
    Buy,
    #[serde(alias = "sell", alias = "Sell")]
    Sell,
    #[serde(alias = "hold", alias = "Hold")]
    Hold,
}

/// Result of a custom agent analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentAnalysis {
    pub agent: String,
    pub description: String,
    pub recommendation: Recommendation,
    /// 0.0 to 1.0.
    pub confidence: Decimal,
    pub reasoning: String,
    /// Fraction of capital to allocate, 0.0 to 1.0.
    pub suggested_allocation: Decimal,
    #[serde(default)]
    pub tool_results: serde_json::Value,
}
