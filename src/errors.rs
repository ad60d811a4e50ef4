/*!
 * Error types for the bhashantar application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while reading or persisting checkpoints.
///
/// These are the only errors that abort a run: a dropped checkpoint write
/// would make a later resume silently skip unfinished work.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Failed to write the checkpoint artifact
    #[error("Failed to persist checkpoint: {0}")]
    WriteFailed(String),

    /// Underlying I/O failure
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from loading or validating the content catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read catalog: {0}")]
    ReadFailed(String),

    /// Catalog is not a JSON array of objects
    #[error("Catalog has unexpected shape: {0}")]
    BadShape(String),

    /// An item is missing its stable string id
    #[error("Catalog item at index {index} has no string 'id' field")]
    MissingId {
        /// Position of the offending item in the catalog array
        index: usize,
    },
}

/// Errors from assembling or writing the merged output file
#[derive(Error, Debug)]
pub enum OutputError {
    /// Serialization or finalization of the output file failed
    #[error("Failed to write output: {0}")]
    WriteFailed(String),

    /// Underlying I/O failure
    #[error("Output I/O error: {0}")]
    Io(#[from] std::io::Error),
}
