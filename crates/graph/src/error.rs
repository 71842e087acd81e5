use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid reference pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Classification report not found: {0} (run `specguard run-classify` first)")]
    MissingClassification(PathBuf),

    #[error(transparent)]
    Protocol(#[from] specguard_protocol::ProtocolError),
}
