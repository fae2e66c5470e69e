//! Core engine — one fetch → average → crossover → trade pass over the pot.

pub mod cycle;
pub mod executor;

pub use cycle::{run_cycle, CycleConfig, CycleReport};
pub use executor::execute;
