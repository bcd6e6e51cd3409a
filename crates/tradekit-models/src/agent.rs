use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_AGENT_MODEL: &str = "gpt-4o";

/// Analyst whose per-ticker entries carry position limits instead of a view.
pub const RISK_MANAGEMENT_AGENT: &str = "risk_management_agent";

/// A user-created agent: a model, a prompt, and the tools it may use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_model() -> String {
    DEFAULT_AGENT_MODEL.to_string()
}

impl AgentDefinition {
    /// Explicit system prompt, or `"You are {name}, {description}"`.
    pub fn effective_system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| format!("You are {}, {}", self.name, self.description))
    }
}

/// Context handed to a custom agent's analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisState {
    #[serde(default = "empty_object")]
    pub market_data: serde_json::Value,
    #[serde(default)]
    pub news_summary: String,
    #[serde(default = "empty_object")]
    pub portfolio: serde_json::Value,
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self {
            market_data: empty_object(),
            news_summary: String::new(),
            portfolio: empty_object(),
        }
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// A single analyst's view of one ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalystSignal {
    pub signal: String,
    pub confidence: Decimal,
}

/// Risk bounds for one ticker supplied by the risk manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskLimits {
    #[serde(default)]
    pub remaining_position_limit: Decimal,
    /// Fallback price when no live quote is available.
    #[serde(default)]
    pub current_price: Decimal,
}

/// One entry of `analyst_signals[agent][ticker]`. The risk manager reports
/// limits where every other analyst reports a signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SignalEntry {
    Signal(AnalystSignal),
    Risk(RiskLimits),
}

impl SignalEntry {
    pub fn as_signal(&self) -> Option<&AnalystSignal> {
        match self {
            SignalEntry::Signal(signal) => Some(signal),
            SignalEntry::Risk(_) => None,
        }
    }

    pub fn as_risk(&self) -> Option<&RiskLimits> {
        match self {
            SignalEntry::Risk(risk) => Some(risk),
            SignalEntry::Signal(_) => None,
        }
    }
}

impl From<AnalystSignal> for SignalEntry {
    fn from(signal: AnalystSignal) -> Self {
        SignalEntry::Signal(signal)
    }
}

impl From<RiskLimits> for SignalEntry {
    fn from(risk: RiskLimits) -> Self {
        SignalEntry::Risk(risk)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSnapshot {
    #[serde(default)]
    pub cash: Decimal,
    #[serde(default = "empty_object")]
    pub positions: serde_json::Value,
    #[serde(default)]
    pub margin_requirement: Decimal,
    #[serde(default)]
    pub margin_used: Decimal,
}

/// Input to the tool-enabled portfolio manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioRequest {
    pub tickers: Vec<String>,
    #[serde(default)]
    pub portfolio: PortfolioSnapshot,
    /// analyst name -> ticker -> entry
    #[serde(default)]
    pub analyst_signals: BTreeMap<String, BTreeMap<String, SignalEntry>>,
    /// ticker -> risk limits, overriding the risk manager's entries
    #[serde(default)]
    pub risk: BTreeMap<String, RiskLimits>,
    /// Extra tools on top of the manager's defaults.
    #[serde(default)]
    pub tools: Vec<String>,
}

impl PortfolioRequest {
    /// Limits for `ticker`: the explicit `risk` entry, else the risk manager's
    /// entry in `analyst_signals`, else zero.
    pub fn risk_for(&self, ticker: &str) -> RiskLimits {
        self.risk
            .get(ticker)
            .or_else(|| {
                self.analyst_signals
                    .get(RISK_MANAGEMENT_AGENT)
                    .and_then(|by_ticker| by_ticker.get(ticker))
                    .and_then(SignalEntry::as_risk)
            })
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn agent_definition_defaults() {
        let def: AgentDefinition =
            serde_json::from_str(r#"{"name": "scout", "description": "a momentum trader"}"#)
                .unwrap();
        assert_eq!(def.model, "gpt-4o");
        assert!(def.tools.is_empty());
        assert_eq!(
            def.effective_system_prompt(),
            "You are scout, a momentum trader"
        );
    }

    #[test]
    fn explicit_system_prompt_wins() {
        let def = AgentDefinition {
            name: "scout".to_string(),
            description: "d".to_string(),
            model: "gpt-4o".to_string(),
            tools: vec![],
            system_prompt: Some("Be terse.".to_string()),
        };
        assert_eq!(def.effective_system_prompt(), "Be terse.");
    }

    #[test]
    fn analysis_state_defaults_to_empty_objects() {
        let state: AnalysisState = serde_json::from_str("{}").unwrap();
        assert!(state.market_data.as_object().unwrap().is_empty());
        assert!(state.portfolio.as_object().unwrap().is_empty());
        assert_eq!(state.news_summary, "");
    }

    #[test]
    fn portfolio_request_from_json() {
        let request: PortfolioRequest = serde_json::from_str(
            r#"{
                "tickers": ["AAPL"],
                "portfolio": {"cash": "5000"},
                "analyst_signals": {"technical": {"AAPL": {"signal": "bullish", "confidence": 70}}},
                "risk": {"AAPL": {"remaining_position_limit": "2000", "current_price": "150"}}
            }"#,
        )
        .unwrap();
        assert_eq!(request.portfolio.cash, dec!(5000));
        assert_eq!(
            request.analyst_signals["technical"]["AAPL"].as_signal().unwrap().signal,
            "bullish"
        );
        assert_eq!(request.risk["AAPL"].current_price, dec!(150));
        assert!(request.tools.is_empty());
    }

    #[test]
    fn analysis_state_default_matches_empty_body() {
        let parsed: AnalysisState = serde_json::from_str("{}").unwrap();
        assert_eq!(AnalysisState::default(), parsed);
    }

    #[test]
    fn risk_limits_ride_along_in_analyst_signals() {
        let request: PortfolioRequest = serde_json::from_str(
            r#"{
                "tickers": ["AAPL", "MSFT"],
                "analyst_signals": {
                    "technical_analyst": {"AAPL": {"signal": "bullish", "confidence": 80}},
                    "risk_management_agent": {
                        "AAPL": {"remaining_position_limit": 1000, "current_price": 100, "reasoning": "ok"},
                        "MSFT": {"remaining_position_limit": 500, "current_price": 250}
                    }
                },
                "risk": {"MSFT": {"remaining_position_limit": "750", "current_price": "250"}}
            }"#,
        )
        .unwrap();

        assert!(request.analyst_signals["technical_analyst"]["AAPL"]
            .as_signal()
            .is_some());
        let aapl = request.risk_for("AAPL");
        assert_eq!(aapl.remaining_position_limit, dec!(1000));
        assert_eq!(aapl.current_price, dec!(100));
        // explicit risk overrides the risk manager
        assert_eq!(request.risk_for("MSFT").remaining_position_limit, dec!(750));
        assert_eq!(request.risk_for("TSLA"), RiskLimits::default());
    }
}
