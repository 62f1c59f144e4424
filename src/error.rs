// ⚠️ Error types - data and configuration errors
//
// Transient traffic-source failures never show up here: they are absorbed by
// the fallback generator. What remains are programmer/data errors that must
// fail loudly at construction time.

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    /// A record referenced a location that is not in the registry
    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    /// A record failed range validation (negative speed, empty text, ...)
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// More than one traffic record was supplied for the same location
    #[error("Duplicate traffic record for location: {0}")]
    DuplicateTraffic(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
