use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid project root: {0}")]
    InvalidRoot(String),

    #[error("Inventory report not found: {0} (run `specguard run-inventory` first)")]
    MissingInventory(PathBuf),

    #[error(transparent)]
    Protocol(#[from] specguard_protocol::ProtocolError),
}
