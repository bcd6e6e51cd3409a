use async_trait::async_trait;
use chrono::NaiveDate;
use tradekit_models::brokerage::{
    Account, Bar, BarTimeframe, MarketClock, Order, OrderRequest, OrderStatusFilter,
    PortfolioHistory, Position, Quote,
};

use uuid::Uuid;

use crate::error::BrokerError;

/// Brokerage operations used by the tool catalog. Mockable for testing.
#[async_trait]
pub trait Brokerage: Send + Sync {
    async fn account(&self) -> Result<Account, BrokerError>;

    async fn positions(&self) -> Result<Vec<Position>, BrokerError>;

    async fn portfolio_history(
        &self,
        period: &str,
        timeframe: &str,
    ) -> Result<PortfolioHistory, BrokerError>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError>;

    async fn orders(&self, status: OrderStatusFilter, limit: u32)
        -> Result<Vec<Order>, BrokerError>;

    async fn cancel_order(&self, order_id: Uuid) -> Result<(), BrokerError>;

    async fn bars(
        &self,
        symbol: &str,
        timeframe: BarTimeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, BrokerError>;

    /// `Ok(None)` when the broker has no quote for the symbol.
    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, BrokerError>;

    async fn clock(&self) -> Result<MarketClock, BrokerError>;
}
