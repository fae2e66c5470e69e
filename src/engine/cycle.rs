//! One evaluation cycle over the whole watch-list.
//!
//! Coins are processed one at a time in watch-list order: fetch bars,
//! compute averages, check the crossover, simulate the trade, record it.
//! Per-coin failures are logged and counted; they never stop the cycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, error, info, warn};

use super::executor;
use crate::config::AppConfig;
use crate::market::{FetchResult, MarketData};
use crate::storage::TransactionLog;
use crate::strategy::{evaluate, moving_averages, Signal};
use crate::types::{Coin, PotState, TradeSide, TransactionRecord};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub base_currency: String,
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            base_currency: "USDT".to_string(),
            short_window: 7,
            long_window: 21,
        }
    }
}

impl From<&AppConfig> for CycleConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            base_currency: cfg.exchange.base_currency.clone(),
            short_window: cfg.strategy.short_window,
            long_window: cfg.strategy.long_window,
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of one run over the watch-list.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Coins whose averages were computed this cycle.
    pub coins_evaluated: usize,
    /// Coins skipped because the market data source was unavailable.
    pub skipped_no_data: usize,
    /// Coins skipped because no averages could be computed.
    pub skipped_no_averages: usize,
    pub buys: usize,
    pub sells: usize,
    /// Crossovers whose trade the executor refused.
    pub rejected: usize,
    pub log_failures: usize,
    pub pot_before: Decimal,
    pub pot_after: Decimal,
    pub transactions: Vec<TransactionRecord>,
}

impl CycleReport {
    pub fn trades(&self) -> usize {
        self.buys + self.sells
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evaluated={} skipped={} buys={} sells={} rejected={} log_failures={} pot={} -> {}",
            self.coins_evaluated,
            self.skipped_no_data + self.skipped_no_averages,
            self.buys,
            self.sells,
            self.rejected,
            self.log_failures,
            self.pot_before,
            self.pot_after,
        )
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// Run one cycle and return the updated pot with a report.
///
/// `now` is both the bar cutoff and the timestamp on recorded trades.
pub async fn run_cycle(
    market: &dyn MarketData,
    mut pot: PotState,
    config: &CycleConfig,
    log: &TransactionLog,
    now: DateTime<Utc>,
) -> (PotState, CycleReport) {
    let mut report = CycleReport {
        pot_before: pot.pot_total,
        ..Default::default()
    };

    info!(
        source = market.name(),
        coins = pot.coins.len(),
        pot_total = %pot.pot_total,
        "Starting cycle"
    );

    let coins = std::mem::take(&mut pot.coins);
    for coin in coins {
        let (coin, pot_total) =
            process_coin(market, coin, pot.pot_total, config, log, now, &mut report).await;
        pot.pot_total = pot_total;
        pot.coins.push(coin);
    }

    report.pot_after = pot.pot_total;
    (pot, report)
}

async fn process_coin(
    market: &dyn MarketData,
    mut coin: Coin,
    pot_total: Decimal,
    config: &CycleConfig,
    log: &TransactionLog,
    now: DateTime<Utc>,
    report: &mut CycleReport,
) -> (Coin, Decimal) {
    let bars = match market
        .fetch_bars(&coin.ticker, &config.base_currency, now)
        .await
    {
        FetchResult::Bars(bars) => bars,
        FetchResult::Unavailable { reason } => {
            warn!(ticker = %coin.ticker, reason = %reason, "No market data, skipping coin this cycle");
            report.skipped_no_data += 1;
            return (coin, pot_total);
        }
    };

    // Stored averages are kept when no new ones can be computed.
    let Some(ma) = moving_averages(
        &coin.ticker,
        Some(bars.as_slice()),
        config.short_window,
        config.long_window,
    ) else {
        report.skipped_no_averages += 1;
        return (coin, pot_total);
    };
    // Averages exist, so at least one bar does.
    let Some(price) = bars.last().map(|b| b.close) else {
        report.skipped_no_averages += 1;
        return (coin, pot_total);
    };

    report.coins_evaluated += 1;
    let signal = evaluate(coin.previous_averages(), ma, coin.is_active());
    debug!(
        ticker = %coin.ticker,
        ma7 = %ma.short,
        ma21 = %ma.long,
        price = %price,
        signal = ?signal,
        "Crossover evaluated"
    );

    let side = match signal {
        Signal::Buy => Some(TradeSide::Buy),
        Signal::Sell => Some(TradeSide::Sell),
        Signal::Hold => None,
    };

    let mut pot_total = pot_total;
    if let Some(side) = side {
        let held = coin.coins_purchased;
        match executor::execute(coin.clone(), side, price, pot_total) {
            Ok((traded, new_total)) => {
                let quantity = match side {
                    TradeSide::Buy => traded.coins_purchased,
                    TradeSide::Sell => held,
                };
                let record = TransactionRecord {
                    timestamp: now,
                    ticker: traded.ticker.clone(),
                    side,
                    price,
                    quantity,
                };
                match side {
                    TradeSide::Buy => report.buys += 1,
                    TradeSide::Sell => report.sells += 1,
                }
                if let Err(e) = log.append(&record) {
                    error!(error = %e, "Transaction log write failed, continuing");
                    report.log_failures += 1;
                }
                report.transactions.push(record);
                coin = traded;
                pot_total = new_total;
            }
            Err(e) => {
                warn!(error = %e, side = %side, "Trade rejected");
                report.rejected += 1;
            }
        }
    }

    coin.ma7 = Some(ma.short);
    coin.ma21 = Some(ma.long);
    (coin, pot_total)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
