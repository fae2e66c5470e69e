//! Persistence layer.
//!
//! Everything the bot keeps between runs lives in three flat text files:
//! the read-only watch-list, the pot state (rewritten at the end of every
//! run) and the append-only transaction log.

pub mod pot;
pub mod transactions;
pub mod watchlist;

pub use pot::{load_pot, save_pot};
pub use transactions::TransactionLog;
pub use watchlist::load_coins;

use std::path::Path;

use crate::types::InvestError;

/// Read a whole text file, mapping failures onto the loader error kinds.
///
/// An unopenable file is an `Io` error; content that is not valid UTF-8
/// is reported as malformed (`General`).
pub(crate) fn read_source(path: &Path) -> Result<String, InvestError> {
    std::fs::read_to_string(path).map_err(|source| {
        let path = path.display().to_string();
        if source.kind() == std::io::ErrorKind::InvalidData {
            InvestError::General {
                path,
                line: 0,
                message: source.to_string(),
            }
        } else {
            InvestError::Io { path, source }
        }
    })
}
