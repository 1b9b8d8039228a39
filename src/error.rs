//! Error types for the telemetry library.

use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors that can occur while loading or persisting telemetry.
///
/// Recording and querying never fail; these only surface from the
/// fallible persistence entry points and from store implementations.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The key-value store rejected or failed an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Snapshot (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage key cannot be used by this store.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Persisted value does not have the snapshot shape.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unrecognized source category name.
    #[error("Unknown source category: {0}")]
    InvalidCategory(String),
}
