//! Common error types for Test Monkey

use thiserror::Error;

/// Common result type for Test Monkey operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared across the backend.
///
/// Every externally invocable operation resolves to either a success
/// payload or one of these variants carrying a short human-readable
/// message; raw internal errors never cross the caller boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON encode/decode error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed caller input, rejected before any side effect
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Referenced mission/voucher/account absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ownership mismatch
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Already-redeemed, already-claimed, expired
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Text-generation call failure or non-JSON response
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Structurally invalid generated report
    #[error("Report contract violation: {0}")]
    ContractViolation(String),

    /// Internal invariant failure
    #[error("Internal error: {0}")]
    Internal(String),
}
