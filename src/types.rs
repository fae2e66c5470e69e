//! Shared types for the INVEST bot.
//!
//! These types form the data model used across all modules: the coin
//! watch-list entries, the simulated pot they draw on, the price bars
//! fetched from the exchange, and the trade records written to the log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Holding flag
// ---------------------------------------------------------------------------

/// Whether a coin currently holds a simulated position.
///
/// Persisted as `Active` / `None` in the pot file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Holding {
    Active,
    #[default]
    Inactive,
}

impl fmt::Display for Holding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holding::Active => write!(f, "Active"),
            Holding::Inactive => write!(f, "None"),
        }
    }
}

impl std::str::FromStr for Holding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(Holding::Active),
            "None" => Ok(Holding::Inactive),
            other => anyhow::bail!("Unknown holding flag: {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Coin
// ---------------------------------------------------------------------------

/// One watched coin and its simulated position.
///
/// Built fresh from the watch-list each run, then enriched from the pot
/// file. `ma7` / `ma21` are the averages computed on the previous cycle
/// and stay `None` until the first successful computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub ticker: String,
    /// Fraction of the pot allocated on a buy (0 < w <= 1).
    pub weighting: Decimal,
    pub holding: Holding,
    /// Last buy price, zero while inactive.
    pub purchase_price: Decimal,
    /// Quantity held, zero while inactive.
    pub coins_purchased: Decimal,
    pub ma7: Option<Decimal>,
    pub ma21: Option<Decimal>,
}

impl Coin {
    pub fn new(ticker: impl Into<String>, weighting: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            weighting,
            holding: Holding::Inactive,
            purchase_price: Decimal::ZERO,
            coins_purchased: Decimal::ZERO,
            ma7: None,
            ma21: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.holding == Holding::Active
    }

    /// Previous cycle's (short, long) averages, if both were recorded.
    pub fn previous_averages(&self) -> Option<(Decimal, Decimal)> {
        self.ma7.zip(self.ma21)
    }

    /// Active implies a positive price and quantity; inactive implies both zero.
    pub fn is_consistent(&self) -> bool {
        match self.holding {
            Holding::Active => {
                self.purchase_price > Decimal::ZERO && self.coins_purchased > Decimal::ZERO
            }
            Holding::Inactive => {
                self.purchase_price.is_zero() && self.coins_purchased.is_zero()
            }
        }
    }

    /// Clear the position back to the inactive state.
    pub fn reset_position(&mut self) {
        self.holding = Holding::Inactive;
        self.purchase_price = Decimal::ZERO;
        self.coins_purchased = Decimal::ZERO;
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (w={} | {} | price={} | qty={} | MA7={} | MA21={})",
            self.ticker,
            self.weighting,
            self.holding,
            self.purchase_price,
            self.coins_purchased,
            fmt_optional(self.ma7),
            fmt_optional(self.ma21),
        )
    }
}

/// Render an optional decimal the way the pot file stores it.
pub fn fmt_optional(value: Option<Decimal>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

// ---------------------------------------------------------------------------
// Pot
// ---------------------------------------------------------------------------

/// The shared capital pool and the coins drawing on it.
///
/// Threaded through every pipeline stage by value; nothing about it is
/// global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotState {
    pub pot_total: Decimal,
    pub coins: Vec<Coin>,
}

impl PotState {
    pub fn new(coins: Vec<Coin>) -> Self {
        Self {
            pot_total: Decimal::ZERO,
            coins,
        }
    }

    pub fn coin(&self, ticker: &str) -> Option<&Coin> {
        self.coins.iter().find(|c| c.ticker == ticker)
    }

    pub fn coin_mut(&mut self, ticker: &str) -> Option<&mut Coin> {
        self.coins.iter_mut().find(|c| c.ticker == ticker)
    }

    /// Number of coins currently holding a position.
    pub fn active_count(&self) -> usize {
        self.coins.iter().filter(|c| c.is_active()).count()
    }
}

impl fmt::Display for PotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pot={} | coins={} | active={}",
            self.pot_total,
            self.coins.len(),
            self.active_count(),
        )
    }
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

/// One historical kline bar. Only `close` and time ordering drive the
/// strategy; the rest is kept for logging and completeness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
    pub quote_volume: Decimal,
    pub trade_count: u64,
    pub taker_buy_base_volume: Decimal,
    pub taker_buy_quote_volume: Decimal,
}

impl PriceBar {
    /// Helper to build a bar with a given close; all other prices equal it.
    #[cfg(test)]
    pub fn sample(open_time: DateTime<Utc>, close: Decimal) -> Self {
        Self {
            open_time,
            open: close,
            high: close,
            low: close,
            close,
            volume: Decimal::ONE,
            close_time: open_time + chrono::Duration::hours(4) - chrono::Duration::milliseconds(1),
            quote_volume: close,
            trade_count: 1,
            taker_buy_base_volume: Decimal::ZERO,
            taker_buy_quote_volume: Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// One executed (simulated) trade, as appended to the transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub side: TradeSide,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl TransactionRecord {
    /// Log date format: UTC, `YYYY/MM/DD HH:MM:SS`.
    pub const DATE_FORMAT: &'static str = "%Y/%m/%d %H:%M:%S";
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} , {} , {} , {} , {}",
            self.timestamp.format(Self::DATE_FORMAT),
            self.ticker,
            self.side,
            self.price.normalize(),
            self.quantity.normalize(),
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for INVEST.
#[derive(Debug, thiserror::Error)]
pub enum InvestError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed content in {path} (line {line}): {message}")]
    General {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Market data unavailable for {symbol}: {reason}")]
    MarketDataUnavailable { symbol: String, reason: String },

    #[error("Computation error for {ticker}: {message}")]
    Computation { ticker: String, message: String },

    #[error("Invalid trade price for {ticker}: {price}")]
    InvalidPrice { ticker: String, price: Decimal },

    #[error("Failed to append to transaction log {path}: {source}")]
    TransactionLog {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl InvestError {
    /// Whether this error must abort the run before anything is persisted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InvestError::Io { .. } | InvestError::General { .. } | InvestError::Config(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
