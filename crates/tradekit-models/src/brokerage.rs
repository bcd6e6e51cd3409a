use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Brokerage account summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub cash: Decimal,
    pub buying_power: Decimal,
    pub equity: Decimal,
    pub portfolio_value: Decimal,
    pub currency: String,
    pub pattern_day_trader: bool,
    pub trading_blocked: bool,
    pub account_blocked: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub symbol: String,
    /// Signed share count as reported by the broker (negative for shorts).
    pub qty: Decimal,
    pub side: PositionSide,
    pub market_value: Decimal,
    pub avg_entry_price: Decimal,
    pub current_price: Option<Decimal>,
    pub unrealized_pl: Option<Decimal>,
    pub unrealized_plpc: Option<Decimal>,
    pub cost_basis: Decimal,
    pub asset_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioHistory {
    pub timestamp: Vec<DateTime<Utc>>,
    pub equity: Vec<Decimal>,
    pub profit_loss: Vec<Decimal>,
    pub profit_loss_pct: Vec<Decimal>,
    pub base_value: Option<Decimal>,
    pub timeframe: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// `"buy"` in any case is a buy; anything else sells.
    pub fn from_loose(side: &str) -> Self {
        if side.eq_ignore_ascii_case("buy") {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
    TrailingStop,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Day,
    Gtc,
    Opg,
    Cls,
    Ioc,
    Fok,
}

/// An order submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: Decimal,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(symbol: &str, qty: Decimal, side: OrderSide) -> Self {
        Self {
            symbol: symbol.to_string(),
            qty,
            side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Day,
            limit_price: None,
        }
    }

    pub fn limit(symbol: &str, qty: Decimal, limit_price: Decimal, side: OrderSide) -> Self {
        Self {
            symbol: symbol.to_string(),
            qty,
            side,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Day,
            limit_price: Some(limit_price),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub symbol: String,
    pub qty: Option<Decimal>,
    pub side: OrderSide,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusFilter {
    Open,
    Closed,
    All,
}

impl OrderStatusFilter {
    /// Unknown filters fall back to `Open`.
    pub fn from_loose(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "closed" => OrderStatusFilter::Closed,
            "all" => OrderStatusFilter::All,
            _ => OrderStatusFilter::Open,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusFilter::Open => "open",
            OrderStatusFilter::Closed => "closed",
            OrderStatusFilter::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BarTimeframe {
    #[serde(rename = "1Min")]
    Minute,
    #[serde(rename = "1Hour")]
    Hour,
    #[serde(rename = "1Day")]
    Day,
}

impl BarTimeframe {
    /// Unknown timeframes fall back to daily bars.
    pub fn from_loose(timeframe: &str) -> Self {
        match timeframe {
            "1Min" => BarTimeframe::Minute,
            "1Hour" => BarTimeframe::Hour,
            _ => BarTimeframe::Day,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BarTimeframe::Minute => "1Min",
            BarTimeframe::Hour => "1Hour",
            BarTimeframe::Day => "1Day",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub ask_price: Option<Decimal>,
    pub ask_size: Option<u64>,
    pub bid_price: Option<Decimal>,
    pub bid_size: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Quote {
    /// Midpoint of bid and ask. Requires both sides to be positive.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.bid_price, self.ask_price) {
            (Some(bid), Some(ask)) if bid > Decimal::ZERO && ask > Decimal::ZERO => {
                Some((bid + ask) / Decimal::TWO)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketClock {
    pub timestamp: DateTime<Utc>,
    pub is_open: bool,
    pub next_open: DateTime<Utc>,
    pub next_close: DateTime<Utc>,
}

/// Portfolio shaped for the decision agents: one entry per requested ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentPortfolio {
    pub cash: Decimal,
    pub buying_power: Decimal,
    pub portfolio_value: Decimal,
    pub positions: BTreeMap<String, TickerPosition>,
    pub realized_gains: BTreeMap<String, RealizedGains>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TickerPosition {
    pub long: u64,
    pub short: u64,
    pub long_cost_basis: Decimal,
    pub short_cost_basis: Decimal,
    pub short_margin_used: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RealizedGains {
    pub long: Decimal,
    pub short: Decimal,
}

impl AgentPortfolio {
    /// Build the agent view from broker records. Positions outside `tickers` are ignored.
    pub fn from_broker(account: &Account, positions: &[Position], tickers: &[String]) -> Self {
        let mut portfolio = Self {
            cash: account.cash,
            buying_power: account.buying_power,
            portfolio_value: account.portfolio_value,
            positions: BTreeMap::new(),
            realized_gains: BTreeMap::new(),
        };

        for ticker in tickers {
            portfolio
                .positions
                .insert(ticker.clone(), TickerPosition::default());
            portfolio
                .realized_gains
                .insert(ticker.clone(), RealizedGains::default());
        }

        for position in positions {
            let Some(entry) = portfolio.positions.get_mut(&position.symbol) else {
                continue;
            };
            let shares = position.qty.abs();
            let per_share = if shares > Decimal::ZERO {
                position.cost_basis.abs() / shares
            } else {
                Decimal::ZERO
            };
            let whole = shares.trunc().to_u64().unwrap_or(0);
            match position.side {
                PositionSide::Long => {
                    entry.long = whole;
                    entry.long_cost_basis = per_share;
                }
                PositionSide::Short => {
                    entry.short = whole;
                    entry.short_cost_basis = per_share;
                    entry.short_margin_used = position.market_value.abs();
                }
            }
        }

        portfolio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account() -> Account {
        Account {
            id: Uuid::nil(),
            cash: dec!(10000.00),
            buying_power: dec!(20000.00),
            equity: dec!(25000.00),
            portfolio_value: dec!(25000.00),
            currency: "USD".to_string(),
            pattern_day_trader: false,
            trading_blocked: false,
            account_blocked: false,
            created_at: None,
        }
    }

    fn position(symbol: &str, qty: Decimal, side: PositionSide, cost_basis: Decimal) -> Position {
        Position {
            symbol: symbol.to_string(),
            qty,
            side,
            market_value: qty * dec!(150),
            avg_entry_price: dec!(140),
            current_price: Some(dec!(150)),
            unrealized_pl: None,
            unrealized_plpc: None,
            cost_basis,
            asset_id: Uuid::nil(),
        }
    }

    #[test]
    fn agent_portfolio_fills_requested_tickers() {
        let tickers = vec!["AAPL".to_string(), "MSFT".to_string()];
        let portfolio = AgentPortfolio::from_broker(&account(), &[], &tickers);
        assert_eq!(portfolio.positions.len(), 2);
        assert_eq!(portfolio.positions["MSFT"], TickerPosition::default());
        assert_eq!(portfolio.realized_gains["AAPL"].long, Decimal::ZERO);
        assert_eq!(portfolio.cash, dec!(10000.00));
    }

    #[test]
    fn agent_portfolio_applies_long_and_short() {
        let tickers = vec!["AAPL".to_string(), "TSLA".to_string()];
        let positions = vec![
            position("AAPL", dec!(10), PositionSide::Long, dec!(1400)),
            position("TSLA", dec!(-5), PositionSide::Short, dec!(-1000)),
            position("NVDA", dec!(3), PositionSide::Long, dec!(300)),
        ];
        let portfolio = AgentPortfolio::from_broker(&account(), &positions, &tickers);

        assert_eq!(portfolio.positions["AAPL"].long, 10);
        assert_eq!(portfolio.positions["AAPL"].long_cost_basis, dec!(140));
        assert_eq!(portfolio.positions["TSLA"].short, 5);
        assert_eq!(portfolio.positions["TSLA"].short_cost_basis, dec!(200));
        assert_eq!(portfolio.positions["TSLA"].short_margin_used, dec!(750));
        assert!(!portfolio.positions.contains_key("NVDA"));
    }

    #[test]
    fn mid_price_requires_both_sides() {
        let mut quote = Quote {
            symbol: "AAPL".to_string(),
            ask_price: Some(dec!(101)),
            ask_size: Some(3),
            bid_price: Some(dec!(99)),
            bid_size: Some(2),
            timestamp: None,
        };
        assert_eq!(quote.mid_price(), Some(dec!(100)));

        quote.bid_price = None;
        assert_eq!(quote.mid_price(), None);

        quote.bid_price = Some(dec!(0));
        assert_eq!(quote.mid_price(), None);
    }

    #[test]
    fn loose_parsers_fall_back() {
        assert_eq!(OrderSide::from_loose("BUY"), OrderSide::Buy);
        assert_eq!(OrderSide::from_loose("short"), OrderSide::Sell);
        assert_eq!(OrderStatusFilter::from_loose("Closed"), OrderStatusFilter::Closed);
        assert_eq!(OrderStatusFilter::from_loose("pending"), OrderStatusFilter::Open);
        assert_eq!(BarTimeframe::from_loose("1Hour"), BarTimeframe::Hour);
        assert_eq!(BarTimeframe::from_loose("5Min"), BarTimeframe::Day);
    }

    #[test]
    fn order_request_serializes_type_field() {
        let request = OrderRequest::limit("AAPL", dec!(5), dec!(150.25), OrderSide::Buy);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "limit");
        assert_eq!(value["time_in_force"], "day");
        assert_eq!(value["limit_price"], "150.25");

        let market = serde_json::to_value(OrderRequest::market("AAPL", dec!(1), OrderSide::Sell)).unwrap();
        assert!(market.get("limit_price").is_none());
    }
}
