//! # AppError
//!
//! Centralized error handling for the Luma content store.
//! Store operations never surface these to callers for not-found cases;
//! they exist for the persistence adapter and the API layer.

use thiserror::Error;

/// The primary error type for all luma-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Post, Comment, Draft)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Input rejected before reaching the store (e.g., missing user header)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Key-value backend failure (e.g., disk full, SQLite locked)
    #[error("storage error: {0}")]
    Storage(String),

    /// Persisted blob could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Luma logic.
pub type Result<T> = std::result::Result<T, AppError>;
