//! Class loading error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for class operations.
pub type ClassResult<T> = Result<T, ClassError>;

/// Errors that can occur while loading or parsing task classes.
#[derive(Debug, Error)]
pub enum ClassError {
    #[error("invalid class identifier: {0}")]
    InvalidIdentifier(String),

    #[error("cannot read class definition {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse class definition {id}: {source}")]
    Parse {
        id: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("class definition {id} declares mismatched name {found:?}")]
    NameMismatch { id: String, found: String },
}
