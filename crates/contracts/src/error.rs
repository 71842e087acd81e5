use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContractError>;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Snapshot not found for unit {version}: {path}")]
    MissingSnapshot { version: u32, path: PathBuf },

    #[error("Fingerprint encoding failed: {0}")]
    Fingerprint(#[from] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] specguard_protocol::ProtocolError),
}
