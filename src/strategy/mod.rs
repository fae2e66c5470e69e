//! Strategy: moving averages and the crossover rule built on them.

pub mod crossover;
pub mod moving_average;

pub use crossover::{decide, evaluate, Signal};
pub use moving_average::{moving_averages, try_moving_averages, MovingAverages};
