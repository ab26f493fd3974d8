//! Error types for esreport-storage

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid store host '{0}'")]
    InvalidHost(String),

    #[error("No store hosts configured")]
    NoHosts,

    #[error("Invalid index pattern '{0}'")]
    InvalidPattern(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
