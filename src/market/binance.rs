//! Binance spot market-data client.
//!
//! Only the public kline endpoint is used; no orders are ever placed.
//!
//! API docs: https://developers.binance.com/docs/binance-spot-api-docs/rest-api
//! Endpoint: `GET /api/v3/klines?symbol=..&interval=4h&endTime=..&limit=..`
//! Auth: API key in the `X-MBX-APIKEY` header (not required for klines,
//! but sent so requests are attributed to the account's rate limits).
//!
//! Each kline is a 12-element JSON array:
//! `[open_time, open, high, low, close, volume, close_time, quote_volume,
//!   trade_count, taker_buy_base, taker_buy_quote, ignore]`
//! with timestamps as integers (ms) and prices/volumes as strings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

use super::{symbol, FetchResult, MarketData};
use crate::config::{Credentials, ExchangeConfig};
use crate::types::{InvestError, PriceBar};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const SOURCE_NAME: &str = "binance";
const KLINES_PATH: &str = "/api/v3/klines";
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Bar interval. Fixed: the strategy is tuned on 4-hour bars.
pub const INTERVAL_4H: &str = "4h";

/// Fields in one kline row.
const KLINE_FIELDS: usize = 12;

/// Binance rejects `limit` above this.
const MAX_LIMIT: u32 = 1000;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Binance REST client for historical klines.
pub struct BinanceClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    limit: u32,
}

impl BinanceClient {
    pub fn new(config: &ExchangeConfig, credentials: Credentials) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent("INVEST/0.1.0 (ma-crossover-bot)")
            .build()
            .context("Failed to build HTTP client for Binance")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            limit: config.bar_limit.min(MAX_LIMIT),
        })
    }

    fn klines_url(&self, symbol: &str, cutoff: DateTime<Utc>) -> String {
        format!(
            "{}{KLINES_PATH}?symbol={}&interval={INTERVAL_4H}&endTime={}&limit={}",
            self.base_url,
            urlencoding::encode(symbol),
            cutoff.timestamp_millis(),
            self.limit,
        )
    }

    /// Request and decode klines, propagating every failure.
    async fn request_klines(&self, symbol: &str, cutoff: DateTime<Utc>) -> Result<Vec<PriceBar>> {
        let url = self.klines_url(symbol, cutoff);
        debug!(url = %url, "Fetching Binance klines");

        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, self.credentials.api_key.expose_secret().as_str())
            .send()
            .await
            .context("Binance API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error {status}: {body}");
        }

        let rows: Vec<Vec<Value>> = resp
            .json()
            .await
            .context("Failed to parse Binance klines response")?;

        parse_klines(rows, symbol)
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn fetch_bars(
        &self,
        ticker: &str,
        base_currency: &str,
        cutoff: DateTime<Utc>,
    ) -> FetchResult {
        let symbol = symbol(ticker, base_currency);
        match self.request_klines(&symbol, cutoff).await {
            Ok(bars) => {
                debug!(symbol = %symbol, bars = bars.len(), "Klines received");
                FetchResult::Bars(bars)
            }
            Err(e) => {
                let err = InvestError::MarketDataUnavailable {
                    symbol,
                    reason: format!("{e:#}"),
                };
                warn!(error = %err, "Market data fetch failed");
                FetchResult::unavailable(format!("{e:#}"))
            }
        }
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Kline decoding
// ---------------------------------------------------------------------------

/// Decode raw kline rows into bars sorted oldest to newest.
pub fn parse_klines(rows: Vec<Vec<Value>>, symbol: &str) -> Result<Vec<PriceBar>> {
    let mut bars = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            parse_kline(row).with_context(|| format!("Bad kline #{i} for {symbol}"))
        })
        .collect::<Result<Vec<_>>>()?;
    bars.sort_by_key(|b| b.open_time);
    Ok(bars)
}

fn parse_kline(row: &[Value]) -> Result<PriceBar> {
    if row.len() != KLINE_FIELDS {
        anyhow::bail!("expected {KLINE_FIELDS} fields, found {}", row.len());
    }

    Ok(PriceBar {
        open_time: timestamp(&row[0], "open_time")?,
        open: decimal(&row[1], "open")?,
        high: decimal(&row[2], "high")?,
        low: decimal(&row[3], "low")?,
        close: decimal(&row[4], "close")?,
        volume: decimal(&row[5], "volume")?,
        close_time: timestamp(&row[6], "close_time")?,
        quote_volume: decimal(&row[7], "quote_volume")?,
        trade_count: row[8]
            .as_u64()
            .with_context(|| format!("trade_count is not an integer: {}", row[8]))?,
        taker_buy_base_volume: decimal(&row[9], "taker_buy_base")?,
        taker_buy_quote_volume: decimal(&row[10], "taker_buy_quote")?,
    })
}

/// Prices arrive as strings; accept bare numbers too.
fn decimal(value: &Value, field: &str) -> Result<Decimal> {
    match value {
        Value::String(s) => {
            Decimal::from_str(s).with_context(|| format!("{field} is not a decimal: {s}"))
        }
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .with_context(|| format!("{field} is not a decimal: {n}")),
        other => anyhow::bail!("{field} has unexpected type: {other}"),
    }
}

fn timestamp(value: &Value, field: &str) -> Result<DateTime<Utc>> {
    let ms = value
        .as_i64()
        .with_context(|| format!("{field} is not an integer timestamp: {value}"))?;
    Utc.timestamp_millis_opt(ms)
        .single()
        .with_context(|| format!("{field} out of range: {ms}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
