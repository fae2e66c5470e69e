//! Market data sources.
//!
//! Defines the `MarketData` trait and the Binance implementation used in
//! production. A fetch never fails the run: any client or network error
//! comes back as `FetchResult::Unavailable` and the coin is skipped for
//! this cycle.

pub mod binance;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::PriceBar;

/// Outcome of a historical-bar request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// Bars ordered oldest to newest. May be empty if the exchange had none.
    Bars(Vec<PriceBar>),
    /// The source could not be reached or answered with garbage.
    Unavailable { reason: String },
}

impl FetchResult {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        FetchResult::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FetchResult::Bars(_))
    }
}

/// Abstraction over historical price sources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch 4-hour bars for `ticker` quoted in `base_currency`, ending at
    /// or before `cutoff`.
    async fn fetch_bars(
        &self,
        ticker: &str,
        base_currency: &str,
        cutoff: DateTime<Utc>,
    ) -> FetchResult;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Exchange symbol for a ticker/base pair, e.g. `BTC` + `USDT` -> `BTCUSDT`.
pub fn symbol(ticker: &str, base_currency: &str) -> String {
    format!("{}{}", ticker.to_uppercase(), base_currency.to_uppercase())
}
