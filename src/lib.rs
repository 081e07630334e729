#[cfg(feature = "cli")]
pub mod cli;
pub mod redo;
pub mod util;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedoError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Truncated file header: {0}")]
    TruncatedHeader(String),

    #[error("Corrupt record at LSN {lsn}: {reason}")]
    CorruptRecord { lsn: u64, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid argument: {0}")]
    Argument(String),
}
