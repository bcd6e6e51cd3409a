use serde_json::Value;
use tradekit_models::agent::AnalysisState;

fn pretty(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Reply format expected from a custom tool agent.
fn analysis_schema() -> String {
    let example = serde_json::json!({
        "recommendation": "BUY/SELL/HOLD",
        "confidence": "0.0-1.0",
        "reasoning": "Your detailed reasoning",
        "suggested_allocation": "0.0-1.0",
        "tool_results": {}
    });
    pretty(&example)
}

/// User prompt for a custom tool agent. `tool_results` is appended when non-empty.
pub fn tool_agent_prompt(tools_info: &str, state: &AnalysisState, tool_results: &Value) -> String {
    let mut prompt = format!(
        "{tools_info}\n\n\
         Current market data:\n{}\n\n\
         News summary:\n{}\n\n\
         Current portfolio:\n{}\n\n\
         Based on this information and using your available tools, provide your analysis \
         and recommendations.\n\
         Format your response as JSON with the following structure:\n{}\n",
        pretty(&state.market_data),
        state.news_summary,
        pretty(&state.portfolio),
        analysis_schema(),
    );

    if tool_results.as_object().is_some_and(|m| !m.is_empty()) {
        prompt.push_str(&format!(
            "\nTool execution results:\n{}\n",
            pretty(tool_results)
        ));
    }

    prompt
}

pub fn portfolio_manager_system_prompt() -> String {
    "You are a portfolio manager making final trading decisions based on multiple tickers.\n\n\
     You have access to real-time data through tools:\n\
     - Account information (cash, buying power, etc.)\n\
     - Current positions\n\
     - Real-time quotes\n\
     - Market status\n\n\
     ## TRADING RULES\n\n\
     For long positions:\n\
     - Only buy if you have available cash\n\
     - Only sell if you currently hold long shares of that ticker\n\
     - Sell quantity must be <= current long position shares\n\
     - Buy quantity must be <= max_shares for that ticker\n\n\
     For short positions:\n\
     - Only short if you have available margin (position value x margin requirement)\n\
     - Only cover if you currently have short shares of that ticker\n\
     - Cover quantity must be <= current short position shares\n\
     - Short quantity must respect margin requirements\n\n\
     The max_shares values are pre-calculated to respect position limits. Consider both \
     long and short opportunities based on signals, keep risk balanced across long and \
     short exposure, and take market hours into account.\n\n\
     ## AVAILABLE ACTIONS\n\n\
     - \"buy\": Open or add to long position\n\
     - \"sell\": Close or reduce long position\n\
     - \"short\": Open or add to short position\n\
     - \"cover\": Close or reduce short position\n\
     - \"hold\": No action\n"
        .to_string()
}

/// Everything the portfolio manager prompt is rendered from.
pub struct DecisionInputs<'a> {
    pub signals_by_ticker: &'a Value,
    pub current_prices: &'a Value,
    pub max_shares: &'a Value,
    pub portfolio_cash: String,
    pub portfolio_positions: &'a Value,
    pub margin_requirement: String,
    pub margin_used: String,
    pub tool_data: &'a Value,
}

pub fn portfolio_manager_prompt(inputs: &DecisionInputs<'_>) -> String {
    let example = serde_json::json!({
        "decisions": {
            "TICKER": {
                "action": "buy/sell/short/cover/hold",
                "quantity": "integer",
                "confidence": "float between 0 and 100",
                "reasoning": "string"
            }
        }
    });

    format!(
        "Based on the team's analysis and real-time data, make your trading decisions for each ticker.\n\n\
         Here are the signals by ticker:\n{}\n\n\
         Current Prices:\n{}\n\n\
         Maximum Shares Allowed For Purchases:\n{}\n\n\
         Portfolio Cash: {}\n\
         Current Positions: {}\n\
         Current Margin Requirement: {}\n\
         Total Margin Used: {}\n\n\
         Real-Time Tool Data:\n{}\n\n\
         Output strictly in JSON with the following structure, one entry per ticker:\n{}\n",
        pretty(inputs.signals_by_ticker),
        pretty(inputs.current_prices),
        pretty(inputs.max_shares),
        inputs.portfolio_cash,
        pretty(inputs.portfolio_positions),
        inputs.margin_requirement,
        inputs.margin_used,
        pretty(inputs.tool_data),
        pretty(&example),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_results_only_when_present() {
        let state = AnalysisState {
            market_data: json!({"AAPL": 190.1}),
            news_summary: "Earnings beat".to_string(),
            portfolio: json!({}),
        };
        let without = tool_agent_prompt("No tools available.", &state, &json!({}));
        assert!(without.starts_with("No tools available."));
        assert!(without.contains("Earnings beat"));
        assert!(!without.contains("Tool execution results"));

        let with = tool_agent_prompt("No tools available.", &state, &json!({"get_clock": {"is_open": true}}));
        assert!(with.contains("Tool execution results"));
        assert!(with.contains("\"is_open\": true"));
    }

    #[test]
    fn manager_prompts_name_every_action() {
        let system = portfolio_manager_system_prompt();
        for action in ["buy", "sell", "short", "cover", "hold"] {
            assert!(system.contains(&format!("\"{action}\"")));
        }
    }
}
