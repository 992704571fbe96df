use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while generating a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot open login store at {path:?}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query failed against login store: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Unrecognized login outcome value: {0}")]
    UnrecognizedOutcome(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
