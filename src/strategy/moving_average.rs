//! Simple moving averages over bar closes.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::types::{InvestError, PriceBar};

/// The short and long averages computed for one coin on one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverages {
    pub short: Decimal,
    pub long: Decimal,
}

/// Arithmetic mean of closing prices over the most recent `short` and
/// `long` bars of an oldest-to-newest series.
///
/// Requires at least `long` bars; a shorter series is reported as a
/// computation error instead of being averaged over fewer bars.
pub fn try_moving_averages(
    ticker: &str,
    bars: &[PriceBar],
    short: usize,
    long: usize,
) -> Result<MovingAverages, InvestError> {
    let fail = |message: String| InvestError::Computation {
        ticker: ticker.to_string(),
        message,
    };

    if short == 0 || short > long {
        return Err(fail(format!("invalid windows: short={short}, long={long}")));
    }
    if bars.len() < long {
        return Err(fail(format!("need {long} bars, have {}", bars.len())));
    }

    Ok(MovingAverages {
        short: mean_of_latest(bars, short).ok_or_else(|| fail("short average overflowed".into()))?,
        long: mean_of_latest(bars, long).ok_or_else(|| fail("long average overflowed".into()))?,
    })
}

/// Like [`try_moving_averages`], but absent data and computation errors
/// both come back as `None` (logged).
pub fn moving_averages(
    ticker: &str,
    bars: Option<&[PriceBar]>,
    short: usize,
    long: usize,
) -> Option<MovingAverages> {
    let bars = bars?;
    if bars.is_empty() {
        debug!(ticker, "No bars, no averages");
        return None;
    }
    match try_moving_averages(ticker, bars, short, long) {
        Ok(ma) => {
            debug!(ticker, short = %ma.short, long = %ma.long, "Moving averages computed");
            Some(ma)
        }
        Err(e) => {
            warn!(error = %e, "Failed to calculate moving averages");
            None
        }
    }
}

/// Mean close of the newest `window` bars, walking backward from the end.
fn mean_of_latest(bars: &[PriceBar], window: usize) -> Option<Decimal> {
    let sum = bars
        .iter()
        .rev()
        .take(window)
        .try_fold(Decimal::ZERO, |acc, bar| acc.checked_add(bar.close))?;
    sum.checked_div(Decimal::from(window))
}
