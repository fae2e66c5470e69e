//! Mock market for integration testing.
//!
//! Provides a deterministic `MarketData` implementation that serves
//! canned bar series per ticker and records every request, all in-memory
//! with no network access.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use invest::market::{FetchResult, MarketData};
use invest::types::PriceBar;

/// A mock market data source.
///
/// Tickers without a configured series answer with `Unavailable`, the
/// same as an exchange outage.
pub struct MockMarket {
    series: HashMap<String, Vec<Decimal>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
    cutoffs: Arc<Mutex<Vec<DateTime<Utc>>>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
            cutoffs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serve `closes` (oldest first) for `ticker`.
    pub fn with_closes(mut self, ticker: &str, closes: Vec<Decimal>) -> Self {
        self.series.insert(ticker.to_string(), closes);
        self
    }

    /// Every (ticker, base currency) requested so far, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// The cutoff passed with each request, in order.
    pub fn cutoffs(&self) -> Vec<DateTime<Utc>> {
        self.cutoffs.lock().unwrap().clone()
    }

    /// 21 closes: 14 at `base` followed by 7 at `tail`, so MA7 = `tail`
    /// and MA21 lies between the two.
    pub fn step(base: Decimal, tail: Decimal) -> Vec<Decimal> {
        let mut closes = vec![base; 14];
        closes.extend(std::iter::repeat(tail).take(7));
        closes
    }
}

/// Build 4-hour bars ending just before `cutoff`.
pub fn bars_ending_at(cutoff: DateTime<Utc>, closes: &[Decimal]) -> Vec<PriceBar> {
    let n = closes.len() as i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let open_time = cutoff - Duration::hours(4 * (n - i as i64));
            PriceBar {
                open_time,
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: Decimal::ONE,
                close_time: open_time + Duration::hours(4) - Duration::milliseconds(1),
                quote_volume: *close,
                trade_count: 10,
                taker_buy_base_volume: Decimal::ZERO,
                taker_buy_quote_volume: Decimal::ZERO,
            }
        })
        .collect()
}

#[async_trait]
impl MarketData for MockMarket {
    async fn fetch_bars(
        &self,
        ticker: &str,
        base_currency: &str,
        cutoff: DateTime<Utc>,
    ) -> FetchResult {
        self.requests
            .lock()
            .unwrap()
            .push((ticker.to_string(), base_currency.to_string()));
        self.cutoffs.lock().unwrap().push(cutoff);

        match self.series.get(ticker) {
            Some(closes) => FetchResult::Bars(bars_ending_at(cutoff, closes)),
            None => FetchResult::unavailable(format!("mock outage for {ticker}")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
