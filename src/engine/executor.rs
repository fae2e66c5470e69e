//! Trade executor.
//!
//! Simulates buys and sells against the shared pot. Nothing is sent to
//! the exchange.
//!
//! Pot accounting: a buy is funded notionally (`pot_total * weighting`)
//! and leaves `pot_total` untouched; a sell adds the proceeds and takes
//! the same notional share back out.

use rust_decimal::Decimal;
use tracing::info;

use crate::types::{Coin, Holding, InvestError, TradeSide};

/// Apply one trade to `coin` and return the updated coin and pot total.
///
/// Rejects non-positive prices and sells without an open position; the coin and pot are only returned on
/// success, so a rejected trade leaves the caller's state as it was.
pub fn execute(
    mut coin: Coin,
    side: TradeSide,
    price: Decimal,
    pot_total: Decimal,
) -> Result<(Coin, Decimal), InvestError> {
    if price <= Decimal::ZERO {
        return Err(InvestError::InvalidPrice {
            ticker: coin.ticker,
            price,
        });
    }

    let overflow = |what: &str| InvestError::Computation {
        ticker: coin.ticker.clone(),
        message: format!("{what} overflowed"),
    };

    let cost_share = pot_total
        .checked_mul(coin.weighting)
        .ok_or_else(|| overflow("pot share"))?;

    match side {
        TradeSide::Buy => {
            let quantity = cost_share
                .checked_div(price)
                .ok_or_else(|| overflow("coin quantity"))?;
            if quantity <= Decimal::ZERO {
                return Err(InvestError::Computation {
                    ticker: coin.ticker,
                    message: format!("nothing to invest from pot {pot_total}"),
                });
            }

            coin.coins_purchased = quantity;
            coin.purchase_price = price;
            coin.holding = Holding::Active;

            info!(
                ticker = %coin.ticker,
                price = %price,
                quantity = %quantity,
                invested = %cost_share,
                "Simulated buy"
            );
            Ok((coin, pot_total))
        }
        TradeSide::Sell => {
            if !coin.is_active() || coin.coins_purchased <= Decimal::ZERO {
                return Err(InvestError::Computation {
                    ticker: coin.ticker,
                    message: "no open position to sell".into(),
                });
            }

            let proceeds = price
                .checked_mul(coin.coins_purchased)
                .ok_or_else(|| overflow("sale proceeds"))?;
            let new_total = pot_total
                .checked_add(proceeds)
                .and_then(|t| t.checked_sub(cost_share))
                .ok_or_else(|| overflow("pot total"))?;

            info!(
                ticker = %coin.ticker,
                price = %price,
                quantity = %coin.coins_purchased,
                bought_at = %coin.purchase_price,
                pot_before = %pot_total,
                pot_after = %new_total,
                "Simulated sell"
            );

            coin.reset_position();
            Ok((coin, new_total))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
