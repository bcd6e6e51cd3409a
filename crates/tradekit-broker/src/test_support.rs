//! In-memory [`Brokerage`] for exercising the tool catalog and agents
//! without network access.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tradekit_models::brokerage::{
    Account, Bar, BarTimeframe, MarketClock, Order, OrderRequest, OrderStatusFilter,
    PortfolioHistory, Position, PositionSide, Quote,
};
use uuid::Uuid;

use crate::client::Brokerage;
use crate::error::BrokerError;

/// A canned brokerage. Every call fails with `BrokerError::Config` when
/// `unconfigured` is set, mirroring a client without credentials.
pub struct MockBrokerage {
    pub account: Account,
    pub positions: Vec<Position>,
    pub quotes: HashMap<String, Quote>,
    pub orders: Vec<Order>,
    pub unconfigured: bool,
    /// Every order submitted, in call order.
    pub submitted: Mutex<Vec<OrderRequest>>,
    /// Every cancelled order id, in call order.
    pub cancelled: Mutex<Vec<Uuid>>,
}

impl Default for MockBrokerage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrokerage {
    pub fn new() -> Self {
        Self {
            account: sample_account(),
            positions: Vec::new(),
            quotes: HashMap::new(),
            orders: Vec::new(),
            unconfigured: false,
            submitted: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::new()
        }
    }

    pub fn with_position(mut self, symbol: &str, qty: Decimal, price: Decimal) -> Self {
        let side = if qty < Decimal::ZERO {
            PositionSide::Short
        } else {
            PositionSide::Long
        };
        self.positions.push(Position {
            symbol: symbol.to_string(),
            qty,
            side,
            market_value: qty * price,
            avg_entry_price: price,
            current_price: Some(price),
            unrealized_pl: Some(Decimal::ZERO),
            unrealized_plpc: Some(Decimal::ZERO),
            cost_basis: qty * price,
            asset_id: Uuid::nil(),
        });
        self
    }

    pub fn with_quote(mut self, symbol: &str, bid: Decimal, ask: Decimal) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                ask_price: Some(ask),
                ask_size: Some(100),
                bid_price: Some(bid),
                bid_size: Some(100),
                timestamp: Some(fixed_time()),
            },
        );
        self
    }

    fn check(&self) -> Result<(), BrokerError> {
        if self.unconfigured {
            return Err(BrokerError::Config(
                "Alpaca API credentials not set in environment variables".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn sample_account() -> Account {
    Account {
        id: Uuid::nil(),
        cash: Decimal::new(100_000, 0),
        buying_power: Decimal::new(200_000, 0),
        equity: Decimal::new(100_000, 0),
        portfolio_value: Decimal::new(100_000, 0),
        currency: "USD".to_string(),
        pattern_day_trader: false,
        trading_blocked: false,
        account_blocked: false,
        created_at: Some(fixed_time()),
    }
}

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 15, 30, 0)
        .single()
        .unwrap_or_default()
}

#[async_trait]
impl Brokerage for MockBrokerage {
    async fn account(&self) -> Result<Account, BrokerError> {
        self.check()?;
        Ok(self.account.clone())
    }

    async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        self.check()?;
        Ok(self.positions.clone())
    }

    async fn portfolio_history(
        &self,
        _period: &str,
        timeframe: &str,
    ) -> Result<PortfolioHistory, BrokerError> {
        self.check()?;
        Ok(PortfolioHistory {
            timestamp: vec![fixed_time()],
            equity: vec![self.account.equity],
            profit_loss: vec![Decimal::ZERO],
            profit_loss_pct: vec![Decimal::ZERO],
            base_value: Some(self.account.equity),
            timeframe: timeframe.to_string(),
        })
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError> {
        self.check()?;
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(order.clone());
        }
        Ok(Order {
            id: Uuid::new_v4(),
            symbol: order.symbol.clone(),
            qty: Some(order.qty),
            side: order.side,
            status: "accepted".to_string(),
            created_at: Some(fixed_time()),
            order_type: Some(order.order_type),
            limit_price: order.limit_price,
            stop_price: None,
        })
    }

    async fn orders(
        &self,
        _status: OrderStatusFilter,
        limit: u32,
    ) -> Result<Vec<Order>, BrokerError> {
        self.check()?;
        Ok(self.orders.iter().take(limit as usize).cloned().collect())
    }

    async fn cancel_order(&self, order_id: Uuid) -> Result<(), BrokerError> {
        self.check()?;
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.push(order_id);
        }
        Ok(())
    }

    async fn bars(
        &self,
        _symbol: &str,
        _timeframe: BarTimeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, BrokerError> {
        self.check()?;
        let bars = start
            .iter_days()
            .take_while(|d| *d <= end)
            .enumerate()
            .filter_map(|(i, day)| {
                let timestamp = day.and_hms_opt(0, 0, 0)?.and_utc();
                let close = Decimal::new(100 + i as i64, 0);
                Some(Bar {
                    timestamp,
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000,
                })
            })
            .collect();
        Ok(bars)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, BrokerError> {
        self.check()?;
        Ok(self.quotes.get(symbol).cloned())
    }

    async fn clock(&self) -> Result<MarketClock, BrokerError> {
        self.check()?;
        Ok(MarketClock {
            timestamp: fixed_time(),
            is_open: true,
            next_open: fixed_time(),
            next_close: fixed_time(),
        })
    }
}
