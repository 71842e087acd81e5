use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpecError>;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Units directory not found: {0}")]
    MissingUnitsDir(PathBuf),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}
