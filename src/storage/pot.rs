//! Pot state file.
//!
//! Layout, one record per line:
//!
//! ```text
//! ### comment lines start with '#'
//! Total:<pot total>
//! <TICKER>:<Active|None>:<purchase_price>:<MA7>:<MA21>:<coins_purchased>
//! ```
//!
//! Moving averages that were never computed are stored as `None`. The file
//! is rewritten in full at the end of each run and must load back exactly.

use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::read_source;
use crate::types::{fmt_optional, Coin, Holding, InvestError, PotState};

const COMMENT_MARKER: char = '#';
const TOTAL_MARKER: &str = "Total:";
const NULL_FIELD: &str = "None";

const HEADER: &str = "\
### Current Pot - this file edited automatically ###
### <Coin Ticker>:Active/None:<PurchasePrice>:<MA7>:<MA21>:<CoinsPurchased>
";

/// Overlay the persisted pot state onto the freshly loaded coin list.
///
/// Tickers in the file that are not on the watch-list are ignored.
pub fn load_pot(coins: Vec<Coin>, path: &Path) -> Result<PotState, InvestError> {
    let content = read_source(path)?;
    let pot = parse_pot(coins, &content, &path.display().to_string())?;
    info!(
        path = %path.display(),
        pot_total = %pot.pot_total,
        active = pot.active_count(),
        "Pot state loaded"
    );
    Ok(pot)
}

/// Parse pot text onto `coins`. `source` is only used in error messages.
pub fn parse_pot(coins: Vec<Coin>, content: &str, source: &str) -> Result<PotState, InvestError> {
    let mut pot = PotState::new(coins);

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        let malformed = |message: String| InvestError::General {
            path: source.to_string(),
            line: idx + 1,
            message,
        };

        if let Some(total) = line.strip_prefix(TOTAL_MARKER) {
            pot.pot_total = Decimal::from_str(total.trim())
                .map_err(|e| malformed(format!("bad pot total: {e}")))?;
            continue;
        }

        let fields: Vec<&str> = line.split(':').map(str::trim).collect();
        let ticker = fields[0];
        let Some(coin) = pot.coin_mut(ticker) else {
            debug!(ticker, "Pot entry not on watch-list, ignoring");
            continue;
        };

        if !(5..=6).contains(&fields.len()) {
            return Err(malformed(format!(
                "expected 6 fields in coin line, found {}",
                fields.len()
            )));
        }

        coin.holding = Holding::from_str(fields[1]).map_err(|e| malformed(e.to_string()))?;
        coin.purchase_price = parse_decimal(fields[2])
            .map_err(|e| malformed(format!("bad purchase price for {ticker}: {e}")))?;
        coin.ma7 = parse_optional(fields[3])
            .map_err(|e| malformed(format!("bad MA7 for {ticker}: {e}")))?;
        coin.ma21 = parse_optional(fields[4])
            .map_err(|e| malformed(format!("bad MA21 for {ticker}: {e}")))?;
        // Older pot files stop after MA21.
        coin.coins_purchased = match fields.get(5) {
            Some(field) => parse_decimal(field)
                .map_err(|e| malformed(format!("bad coin quantity for {ticker}: {e}")))?,
            None => Decimal::ZERO,
        };
        if coin.is_active() && coin.coins_purchased <= Decimal::ZERO {
            return Err(malformed(format!("{ticker} is Active but holds no coins")));
        }

        if !coin.is_consistent() {
            warn!(coin = %coin, "Loaded coin state is inconsistent with its holding flag");
        }
    }

    debug!(pot = %pot, "Parsed pot state");
    Ok(pot)
}

/// Render the pot in the on-disk layout.
pub fn render_pot(pot: &PotState) -> String {
    let mut out = String::from(HEADER);
    out.push_str(&format!("{TOTAL_MARKER}{}\n", pot.pot_total.normalize()));
    for coin in &pot.coins {
        out.push_str(&format!(
            "{}:{}:{}:{}:{}:{}\n",
            coin.ticker,
            coin.holding,
            coin.purchase_price.normalize(),
            fmt_optional(coin.ma7.map(|v| v.normalize())),
            fmt_optional(coin.ma21.map(|v| v.normalize())),
            coin.coins_purchased.normalize(),
        ));
    }
    out
}

/// Overwrite the pot file with the current state.
///
/// Written to a sibling temp file first and renamed into place, so a
/// failed write never leaves a truncated pot behind.
pub fn save_pot(pot: &PotState, path: &Path) -> Result<(), InvestError> {
    let io_err = |source| InvestError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    let written = std::fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(render_pot(pot).as_bytes())?;
        file.sync_all()
    });
    if let Err(source) = written.and_then(|()| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(source));
    }

    debug!(path = %path.display(), pot_total = %pot.pot_total, "Pot state saved");
    Ok(())
}

fn parse_decimal(field: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(field)
}

fn parse_optional(field: &str) -> Result<Option<Decimal>, rust_decimal::Error> {
    if field == NULL_FIELD {
        Ok(None)
    } else {
        parse_decimal(field).map(Some)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
