use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GuardError>;

#[derive(Error, Debug)]
pub enum GuardError {
    /// A phase could not run to completion at all.
    #[error("Phase {phase} failed: {message}")]
    Phase { phase: String, message: String },

    #[error("Required report not found: {0}")]
    MissingReport(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Code generation failed for {target}: {message}")]
    Generator { target: String, message: String },

    #[error(transparent)]
    Spec(#[from] specguard_spec::SpecError),

    #[error(transparent)]
    Indexer(#[from] specguard_indexer::IndexerError),

    #[error(transparent)]
    Protocol(#[from] specguard_protocol::ProtocolError),
}

impl GuardError {
    pub fn phase(phase: impl Into<String>, message: impl std::fmt::Display) -> Self {
        GuardError::Phase {
            phase: phase.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code: `3` when the pipeline itself could not proceed,
    /// `1` for anything unexpected.
    pub fn exit_code(&self) -> u8 {
        match self {
            GuardError::Phase { .. } | GuardError::MissingReport(_) => 3,
            GuardError::Protocol(specguard_protocol::ProtocolError::Config { .. }) => 3,
            _ => 1,
        }
    }
}
