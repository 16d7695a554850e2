use std::io;
use thiserror::Error;

/// Error type for the work pool crate.
///
/// The pool operations themselves never fail; these errors come from
/// the surrounding tooling (report output and run accounting checks).
#[derive(Error, Debug)]
pub enum WorkPoolError {
    /// Writing the run report to stdout failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Encoding the run report as JSON failed.
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A run executed a different number of tasks than were enqueued.
    #[error("{0}")]
    StringError(String),
}

/// Result type alias for work pool operations.
pub type Result<T> = std::result::Result<T, WorkPoolError>;
