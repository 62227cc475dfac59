//! Common error types for DARS

use thiserror::Error;

/// Common result type for DARS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the DARS crates
#[derive(Error, Debug)]
pub enum Error {
    /// Audit document could not be read or decoded
    #[error("Document load error: {0}")]
    DocumentLoad(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Work abandoned because its document or requirement set changed
    #[error("Cancelled: {0}")]
    Cancelled(String),
}
