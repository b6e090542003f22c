//! Error types for Sift

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not applicable: {0}")]
    NotApplicable(String),

    #[error("Already running: {0}")]
    AlreadyRunning(String),

    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Rule store corrupt: {0}")]
    RuleStoreCorrupt(String),
}

pub type Result<T> = std::result::Result<T, Error>;
