//! Alpaca REST payloads and their translation into plain brokerage records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tradekit_models::brokerage::{
    Account, Bar, Order, OrderSide, OrderType, PortfolioHistory, Position, PositionSide, Quote,
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub(crate) struct WireAccount {
    id: Uuid,
    cash: Decimal,
    buying_power: Decimal,
    equity: Decimal,
    portfolio_value: Option<Decimal>,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    pattern_day_trader: bool,
    #[serde(default)]
    trading_blocked: bool,
    #[serde(default)]
    account_blocked: bool,
    created_at: Option<DateTime<Utc>>,
}

impl From<WireAccount> for Account {
    fn from(w: WireAccount) -> Self {
        Account {
            id: w.id,
            cash: w.cash,
            buying_power: w.buying_power,
            equity: w.equity,
            portfolio_value: w.portfolio_value.unwrap_or(w.equity),
            currency: w.currency,
            pattern_day_trader: w.pattern_day_trader,
            trading_blocked: w.trading_blocked,
            account_blocked: w.account_blocked,
            created_at: w.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePosition {
    symbol: String,
    qty: Decimal,
    side: PositionSide,
    market_value: Decimal,
    avg_entry_price: Decimal,
    current_price: Option<Decimal>,
    unrealized_pl: Option<Decimal>,
    unrealized_plpc: Option<Decimal>,
    cost_basis: Option<Decimal>,
    asset_id: Uuid,
}

impl From<WirePosition> for Position {
    fn from(w: WirePosition) -> Self {
        Position {
            cost_basis: w.cost_basis.unwrap_or(w.avg_entry_price * w.qty),
            symbol: w.symbol,
            qty: w.qty,
            side: w.side,
            market_value: w.market_value,
            avg_entry_price: w.avg_entry_price,
            current_price: w.current_price,
            unrealized_pl: w.unrealized_pl,
            unrealized_plpc: w.unrealized_plpc,
            asset_id: w.asset_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePortfolioHistory {
    timestamp: Option<Vec<i64>>,
    equity: Option<Vec<Option<Decimal>>>,
    profit_loss: Option<Vec<Option<Decimal>>>,
    profit_loss_pct: Option<Vec<Option<Decimal>>>,
    base_value: Option<Decimal>,
    timeframe: Option<String>,
}

fn fill_series(series: Option<Vec<Option<Decimal>>>) -> Vec<Decimal> {
    series
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.unwrap_or(Decimal::ZERO))
        .collect()
}

impl WirePortfolioHistory {
    pub(crate) fn into_history(self, requested_timeframe: &str) -> PortfolioHistory {
        PortfolioHistory {
            timestamp: self
                .timestamp
                .unwrap_or_default()
                .into_iter()
                .filter_map(|ts| DateTime::from_timestamp(ts, 0))
                .collect(),
            equity: fill_series(self.equity),
            profit_loss: fill_series(self.profit_loss),
            profit_loss_pct: fill_series(self.profit_loss_pct),
            base_value: self.base_value,
            timeframe: self
                .timeframe
                .unwrap_or_else(|| requested_timeframe.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireOrder {
    id: Uuid,
    symbol: String,
    qty: Option<Decimal>,
    side: OrderSide,
    status: String,
    created_at: Option<DateTime<Utc>>,
    order_type: Option<OrderType>,
    limit_price: Option<Decimal>,
    stop_price: Option<Decimal>,
}

impl From<WireOrder> for Order {
    fn from(w: WireOrder) -> Self {
        Order {
            id: w.id,
            symbol: w.symbol,
            qty: w.qty,
            side: w.side,
            status: w.status,
            created_at: w.created_at,
            order_type: w.order_type,
            limit_price: w.limit_price,
            stop_price: w.stop_price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireBarsPage {
    #[serde(default)]
    pub(crate) bars: Option<Vec<WireBar>>,
    pub(crate) next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireBar {
    t: DateTime<Utc>,
    o: Decimal,
    h: Decimal,
    l: Decimal,
    c: Decimal,
    v: u64,
}

impl From<WireBar> for Bar {
    fn from(w: WireBar) -> Self {
        Bar {
            timestamp: w.t,
            open: w.o,
            high: w.h,
            low: w.l,
            close: w.c,
            volume: w.v,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLatestQuote {
    pub(crate) quote: Option<WireQuote>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireQuote {
    ap: Option<Decimal>,
    #[serde(rename = "as")]
    ask_size: Option<u64>,
    bp: Option<Decimal>,
    bs: Option<u64>,
    t: Option<DateTime<Utc>>,
}

/// Zero prices and sizes mean "no data" on the quote feed.
fn non_zero<T: PartialEq + Default>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v != T::default())
}

impl WireQuote {
    pub(crate) fn into_quote(self, symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            ask_price: non_zero(self.ap),
            ask_size: non_zero(self.ask_size),
            bid_price: non_zero(self.bp),
            bid_size: non_zero(self.bs),
            timestamp: self.t,
        }
    }
}
