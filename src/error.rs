use crate::validator::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("data must be an array of tasks")]
    NotAnArray,

    #[error("export failed: {0}")]
    Export(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
