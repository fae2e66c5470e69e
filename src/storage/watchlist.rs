//! Watch-list loader.
//!
//! The watch-list is read-only and line oriented. A coin is defined by a
//! line of exactly three colon-separated fields, `Coin:<TICKER>:<weighting>`;
//! every other line is ignored.

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::read_source;
use crate::types::{Coin, InvestError};

const COIN_TAG: &str = "Coin";

/// Load the ordered coin list from the watch-list file.
pub fn load_coins(path: &Path) -> Result<Vec<Coin>, InvestError> {
    let content = read_source(path)?;
    let coins = parse_coins(&content, &path.display().to_string())?;
    info!(path = %path.display(), count = coins.len(), "Watch-list loaded");
    Ok(coins)
}

/// Parse watch-list text. `source` is only used in error messages.
pub fn parse_coins(content: &str, source: &str) -> Result<Vec<Coin>, InvestError> {
    let mut coins = Vec::new();
    let mut seen = HashSet::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 3 || fields[0].trim() != COIN_TAG {
            continue;
        }

        let malformed = |message: String| InvestError::General {
            path: source.to_string(),
            line: idx + 1,
            message,
        };

        let ticker = fields[1].trim();
        if ticker.is_empty() {
            return Err(malformed("empty ticker".into()));
        }

        let weighting = Decimal::from_str(fields[2].trim())
            .map_err(|e| malformed(format!("bad weighting for {ticker}: {e}")))?;
        if weighting <= Decimal::ZERO || weighting > Decimal::ONE {
            return Err(malformed(format!(
                "weighting for {ticker} must be in (0, 1], got {weighting}"
            )));
        }

        if !seen.insert(ticker.to_string()) {
            warn!(ticker, line = idx + 1, "Duplicate ticker in watch-list, keeping first");
            continue;
        }

        coins.push(Coin::new(ticker, weighting));
    }

    let tickers: Vec<&str> = coins.iter().map(|c| c.ticker.as_str()).collect();
    debug!(coins = ?tickers, "Parsed watch-list");
    Ok(coins)
}
