use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No active report")]
    NoActiveReport,

    #[error("Invalid retention period: {0} days")]
    InvalidRetention(i64),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
