//! Moving-average crossover decision.

use rust_decimal::Decimal;

use super::moving_average::MovingAverages;

/// `true` iff the short average sits strictly below the long one.
/// Equal averages are never "below".
pub fn decide(ma_short: Decimal, ma_long: Decimal) -> bool {
    ma_short < ma_long
}

/// What the crossover says to do with a coin this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Compare this cycle's averages against the previous cycle's.
///
/// Entering the "below" state is a buy trigger, leaving it a sell
/// trigger. Triggers only act on a coin in the matching state: a buy
/// needs an inactive coin, a sell an active one. Without previous
/// averages there is nothing to cross, so the coin is held.
pub fn evaluate(
    previous: Option<(Decimal, Decimal)>,
    current: MovingAverages,
    active: bool,
) -> Signal {
    let Some((prev_short, prev_long)) = previous else {
        return Signal::Hold;
    };

    let curr = decide(current.short, current.long);
    let prev = decide(prev_short, prev_long);

    match (prev, curr) {
        (false, true) if !active => Signal::Buy,
        (true, false) if active => Signal::Sell,
        _ => Signal::Hold,
    }
}
