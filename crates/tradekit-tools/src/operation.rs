use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tradekit_models::brokerage::{BarTimeframe, OrderSide, OrderStatusFilter};
use tradekit_models::tool::{Tool, ToolKind};
use uuid::Uuid;

use crate::error::ToolError;

/// A fully-typed tool invocation. Built from validated JSON arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOperation {
    GetAccount,
    GetPositions {
        symbols: Option<Vec<String>>,
    },
    GetPortfolioHistory {
        period: String,
        timeframe: String,
    },
    PlaceMarketOrder {
        symbol: String,
        qty: Decimal,
        side: OrderSide,
    },
    PlaceLimitOrder {
        symbol: String,
        qty: Decimal,
        limit_price: Decimal,
        side: OrderSide,
    },
    GetOrders {
        status: OrderStatusFilter,
        limit: u32,
    },
    CancelOrder {
        order_id: Uuid,
    },
    GetBars {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
        timeframe: BarTimeframe,
    },
    GetLatestQuote {
        symbol: String,
    },
    GetClock,
    GetPortfolioForAgents {
        tickers: Vec<String>,
    },
}

impl ToolOperation {
    /// Resolve a tool's binding against its arguments. Expects defaults to be
    /// filled in already; absent optional values resolve to their fallbacks.
    pub fn resolve(tool: &Tool, args: &Map<String, Value>) -> Result<Self, ToolError> {
        let args = Args {
            tool: &tool.name,
            args,
        };

        let op = match tool.kind {
            ToolKind::GetAccount => ToolOperation::GetAccount,
            ToolKind::GetPositions => ToolOperation::GetPositions {
                symbols: args.opt_string_list("symbols")?,
            },
            ToolKind::GetPortfolioHistory => ToolOperation::GetPortfolioHistory {
                period: args.opt_string("period")?.unwrap_or_else(|| "1M".to_string()),
                timeframe: args.opt_string("timeframe")?.unwrap_or_else(|| "1D".to_string()),
            },
            ToolKind::PlaceMarketOrder => ToolOperation::PlaceMarketOrder {
                symbol: args.symbol()?,
                qty: args.positive_decimal("qty")?,
                side: args.side()?,
            },
            ToolKind::PlaceLimitOrder => ToolOperation::PlaceLimitOrder {
                symbol: args.symbol()?,
                qty: args.positive_decimal("qty")?,
                limit_price: args.positive_decimal("limit_price")?,
                side: args.side()?,
            },
            ToolKind::GetOrders => ToolOperation::GetOrders {
                status: args
                    .opt_string("status")?
                    .map(|s| OrderStatusFilter::from_loose(&s))
                    .unwrap_or(OrderStatusFilter::Open),
                limit: args.opt_u32("limit")?.unwrap_or(50),
            },
            ToolKind::CancelOrder => ToolOperation::CancelOrder {
                order_id: args.uuid("order_id")?,
            },
            ToolKind::GetBars => {
                let start = args.date("start_date")?;
                let end = args.date("end_date")?;
                if end < start {
                    return Err(args.invalid("end_date", "must not be before start_date"));
                }
                ToolOperation::GetBars {
                    symbol: args.symbol()?,
                    start,
                    end,
                    timeframe: args
                        .opt_string("timeframe")?
                        .map(|t| BarTimeframe::from_loose(&t))
                        .unwrap_or(BarTimeframe::Day),
                }
            }
            ToolKind::GetLatestQuote => ToolOperation::GetLatestQuote {
                symbol: args.symbol()?,
            },
            ToolKind::GetClock => ToolOperation::GetClock,
            ToolKind::GetPortfolioForAgents => ToolOperation::GetPortfolioForAgents {
                tickers: args.opt_string_list("tickers")?.unwrap_or_default(),
            },
        };

        Ok(op)
    }
}

struct Args<'a> {
    tool: &'a str,
    args: &'a Map<String, Value>,
}

impl Args<'_> {
    fn invalid(&self, parameter: &str, reason: &str) -> ToolError {
        ToolError::InvalidParameter {
            tool: self.tool.to_string(),
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    fn missing(&self, parameter: &str) -> ToolError {
        ToolError::MissingParameter {
            tool: self.tool.to_string(),
            parameter: parameter.to_string(),
        }
    }

    /// `None` for absent or null values.
    fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|v| !v.is_null())
    }

    fn opt_string(&self, name: &str) -> Result<Option<String>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(name, "expected a string")),
        }
    }

    fn string(&self, name: &str) -> Result<String, ToolError> {
        let value = self.opt_string(name)?.ok_or_else(|| self.missing(name))?;
        if value.trim().is_empty() {
            return Err(self.invalid(name, "must not be empty"));
        }
        Ok(value)
    }

    /// Ticker symbols end up in request paths, so only ticker characters pass.
    fn symbol(&self) -> Result<String, ToolError> {
        let value = self.string("symbol")?;
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(self.invalid("symbol", "expected a ticker symbol"));
        }
        Ok(value)
    }

    fn uuid(&self, name: &str) -> Result<Uuid, ToolError> {
        let raw = self.string(name)?;
        Uuid::parse_str(raw.trim()).map_err(|_| self.invalid(name, "expected an order UUID"))
    }

    fn positive_decimal(&self, name: &str) -> Result<Decimal, ToolError> {
        let value = self.get(name).ok_or_else(|| self.missing(name))?;
        let decimal: Decimal = serde_json::from_value(value.clone())
            .map_err(|_| self.invalid(name, "expected a number"))?;
        if decimal <= Decimal::ZERO {
            return Err(self.invalid(name, "must be greater than zero"));
        }
        Ok(decimal)
    }

    fn opt_u32(&self, name: &str) -> Result<Option<u32>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(name, "expected a non-negative integer")),
        }
    }

    fn opt_string_list(&self, name: &str) -> Result<Option<Vec<String>>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(name, "expected a list of strings"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(self.invalid(name, "expected a list of strings")),
        }
    }

    fn date(&self, name: &str) -> Result<NaiveDate, ToolError> {
        let raw = self.string(name)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| self.invalid(name, "expected a YYYY-MM-DD date"))
    }

    fn side(&self) -> Result<OrderSide, ToolError> {
        Ok(self
            .opt_string("side")?
            .map(|s| OrderSide::from_loose(&s))
            .unwrap_or(OrderSide::Buy))
    }
}
