//! Append-only transaction log.
//!
//! One line per executed trade:
//! `<date> , <ticker> , <buy|sell> , <price> , <quantity>`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{InvestError, TransactionRecord};

/// Handle on the transaction log file. The file is opened per append.
#[derive(Debug, Clone)]
pub struct TransactionLog {
    path: PathBuf,
}

impl TransactionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the log if needed.
    pub fn append(&self, record: &TransactionRecord) -> Result<(), InvestError> {
        let log_err = |source| InvestError::TransactionLog {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(log_err)?;
        writeln!(file, "{record}").map_err(log_err)?;

        debug!(path = %self.path.display(), record = %record, "Transaction recorded");
        Ok(())
    }
}
