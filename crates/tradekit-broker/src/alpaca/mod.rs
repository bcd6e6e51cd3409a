//! Alpaca REST implementation of [`Brokerage`].

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use tradekit_models::brokerage::{
    Account, Bar, BarTimeframe, MarketClock, Order, OrderRequest, OrderStatusFilter,
    PortfolioHistory, Position, Quote,
};
use tradekit_models::config::BrokerConfig;
use uuid::Uuid;

use crate::client::Brokerage;
use crate::error::BrokerError;
use wire::{
    WireAccount, WireBarsPage, WireLatestQuote, WireOrder, WirePortfolioHistory, WirePosition,
};

pub const PAPER_TRADING_URL: &str = "https://paper-api.alpaca.markets";
pub const LIVE_TRADING_URL: &str = "https://api.alpaca.markets";
pub const MARKET_DATA_URL: &str = "https://data.alpaca.markets";

pub const API_KEY_ENV: &str = "ALPACA_API_KEY";
pub const SECRET_KEY_ENV: &str = "ALPACA_SECRET_KEY";
pub const PAPER_ENV: &str = "ALPACA_PAPER";

#[derive(Clone)]
pub struct AlpacaCredentials {
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for AlpacaCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpacaCredentials")
            .field("api_key", &"***")
            .field("secret_key", &"***")
            .finish()
    }
}

impl AlpacaCredentials {
    /// Read key and secret from the environment. Blank values count as missing.
    pub fn from_env() -> Option<Self> {
        Self::from_values(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(SECRET_KEY_ENV).ok(),
        )
    }

    pub fn from_values(api_key: Option<String>, secret_key: Option<String>) -> Option<Self> {
        let api_key = api_key.filter(|k| !k.trim().is_empty())?;
        let secret_key = secret_key.filter(|k| !k.trim().is_empty())?;
        Some(Self {
            api_key,
            secret_key,
        })
    }
}

/// `ALPACA_PAPER` overrides the configured flag; anything but `"true"` means live.
pub fn resolve_paper(configured: bool, env_value: Option<&str>) -> bool {
    match env_value {
        Some(value) => value.trim().eq_ignore_ascii_case("true"),
        None => configured,
    }
}

/// Alpaca trading and market data client.
///
/// Constructed without credentials is allowed; every call then fails with
/// [`BrokerError::Config`].
#[derive(Debug, Clone)]
pub struct AlpacaClient {
    http: Client,
    trading_url: String,
    data_url: String,
    credentials: Option<AlpacaCredentials>,
}

impl AlpacaClient {
    pub fn new(
        trading_url: impl Into<String>,
        data_url: impl Into<String>,
        credentials: Option<AlpacaCredentials>,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            trading_url: trading_url.into().trim_end_matches('/').to_string(),
            data_url: data_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Build from configuration, taking credentials and the paper flag from the environment.
    pub fn from_config(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let paper = resolve_paper(config.paper, std::env::var(PAPER_ENV).ok().as_deref());
        let trading_url = config.trading_url.clone().unwrap_or_else(|| {
            if paper {
                PAPER_TRADING_URL.to_string()
            } else {
                LIVE_TRADING_URL.to_string()
            }
        });
        let data_url = config
            .data_url
            .clone()
            .unwrap_or_else(|| MARKET_DATA_URL.to_string());

        let credentials = AlpacaCredentials::from_env();
        if credentials.is_none() {
            warn!("Alpaca credentials not set; brokerage tools will fail until they are configured");
        }

        Self::new(
            trading_url,
            data_url,
            credentials,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn require_credentials(&self) -> Result<&AlpacaCredentials, BrokerError> {
        self.credentials.as_ref().ok_or_else(|| {
            BrokerError::Config(
                "Alpaca API credentials not set in environment variables".to_string(),
            )
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, BrokerError> {
        let credentials = self.require_credentials()?;
        Ok(builder
            .header("APCA-API-KEY-ID", &credentials.api_key)
            .header("APCA-API-SECRET-KEY", &credentials.secret_key))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, BrokerError> {
        debug!(url = %url, "GET");
        let response = self.authorized(self.http.get(&url))?.query(query).send().await?;
        decode(&url, response).await
    }

    fn trading(&self, path: &str) -> String {
        format!("{}{}", self.trading_url, path)
    }

    /// Market data URL from raw segments. Each segment is percent-encoded, so
    /// a caller-supplied value can never climb out of its path position.
    fn data_path(&self, segments: &[&str]) -> Result<String, BrokerError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(BrokerError::InvalidRequest(format!(
                "Invalid path segment {bad:?}"
            )));
        }

        let mut url = Url::parse(&self.data_url)
            .map_err(|e| BrokerError::Config(format!("Invalid data URL {}: {e}", self.data_url)))?;
        url.path_segments_mut()
            .map_err(|_| BrokerError::Config(format!("Data URL {} cannot be a base", self.data_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }
}

async fn check_status(url: &str, response: Response) -> Result<Response, BrokerError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(BrokerError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        warn!(url = %url, status = status.as_u16(), message = %message, "Alpaca request failed");
        return Err(BrokerError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, BrokerError> {
    let response = check_status(url, response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| BrokerError::Decode(format!("{url}: {e}")))
}

#[async_trait]
impl Brokerage for AlpacaClient {
    async fn account(&self) -> Result<Account, BrokerError> {
        let wire: WireAccount = self.get_json(self.trading("/v2/account"), &[]).await?;
        Ok(wire.into())
    }

    async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        let wire: Vec<WirePosition> = self.get_json(self.trading("/v2/positions"), &[]).await?;
        Ok(wire.into_iter().map(Position::from).collect())
    }

    async fn portfolio_history(
        &self,
        period: &str,
        timeframe: &str,
    ) -> Result<PortfolioHistory, BrokerError> {
        let wire: WirePortfolioHistory = self
            .get_json(
                self.trading("/v2/account/portfolio/history"),
                &[
                    ("period", period.to_string()),
                    ("timeframe", timeframe.to_string()),
                ],
            )
            .await?;
        Ok(wire.into_history(timeframe))
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError> {
        let url = self.trading("/v2/orders");
        debug!(symbol = %order.symbol, qty = %order.qty, side = ?order.side, "Submitting order");
        let response = self
            .authorized(self.http.post(&url))?
            .json(order)
            .send()
            .await?;
        let wire: WireOrder = decode(&url, response).await?;
        Ok(wire.into())
    }

    async fn orders(
        &self,
        status: OrderStatusFilter,
        limit: u32,
    ) -> Result<Vec<Order>, BrokerError> {
        let wire: Vec<WireOrder> = self
            .get_json(
                self.trading("/v2/orders"),
                &[
                    ("status", status.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(wire.into_iter().map(Order::from).collect())
    }

    async fn cancel_order(&self, order_id: Uuid) -> Result<(), BrokerError> {
        let url = self.trading(&format!("/v2/orders/{order_id}"));
        let response = self.authorized(self.http.delete(&url))?.send().await?;
        check_status(&url, response).await?;
        Ok(())
    }

    async fn bars(
        &self,
        symbol: &str,
        timeframe: BarTimeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, BrokerError> {
        let url = self.data_path(&["v2", "stocks", symbol, "bars"])?;
        let mut bars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeframe", timeframe.as_str().to_string()),
                ("start", start.format("%Y-%m-%d").to_string()),
                ("end", end.format("%Y-%m-%d").to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("page_token", token));
            }

            let page: WireBarsPage = self.get_json(url.clone(), &query).await?;
            bars.extend(page.bars.unwrap_or_default().into_iter().map(Bar::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(bars)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, BrokerError> {
        let url = self.data_path(&["v2", "stocks", symbol, "quotes", "latest"])?;
        match self.get_json::<WireLatestQuote>(url, &[]).await {
            Ok(wire) => Ok(wire.quote.map(|q| q.into_quote(symbol))),
            Err(BrokerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn clock(&self) -> Result<MarketClock, BrokerError> {
        self.get_json(self.trading("/v2/clock"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_require_both_values() {
        assert!(AlpacaCredentials::from_values(Some("k".into()), Some("s".into())).is_some());
        assert!(AlpacaCredentials::from_values(Some("k".into()), None).is_none());
        assert!(AlpacaCredentials::from_values(Some("  ".into()), Some("s".into())).is_none());
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds =
            AlpacaCredentials::from_values(Some("PKTEST".into()), Some("hunter2".into())).unwrap();
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("PKTEST"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn paper_flag_resolution() {
        assert!(resolve_paper(true, None));
        assert!(!resolve_paper(false, None));
        assert!(resolve_paper(false, Some("TRUE")));
        assert!(!resolve_paper(true, Some("false")));
        assert!(!resolve_paper(true, Some("0")));
    }

    #[tokio::test]
    async fn missing_credentials_fail_every_call() {
        let client = AlpacaClient::new(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!client.has_credentials());

        let err = client.account().await.unwrap_err();
        assert!(matches!(err, BrokerError::Config(_)));
        let err = client.latest_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, BrokerError::Config(_)));
        let err = client.cancel_order(Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, BrokerError::Config(_)));
    }

    #[test]
    fn data_path_encodes_segments() {
        let client = AlpacaClient::new(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9/",
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            client.data_path(&["v2", "stocks", "BRK.B", "bars"]).unwrap(),
            "http://127.0.0.1:9/v2/stocks/BRK.B/bars"
        );
        assert_eq!(
            client
                .data_path(&["v2", "stocks", "../../v2/account", "bars"])
                .unwrap(),
            "http://127.0.0.1:9/v2/stocks/..%2F..%2Fv2%2Faccount/bars"
        );
        assert!(matches!(
            client.data_path(&["v2", "stocks", "..", "bars"]),
            Err(BrokerError::InvalidRequest(_))
        ));
    }
}
