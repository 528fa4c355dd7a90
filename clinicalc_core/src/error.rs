//! Error types for the clinicalc_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for clinicalc_core operations
///
/// Input that fails validation is not an error: it is reported as a
/// [`ValidationResult`](crate::ValidationResult). The variants here are for
/// conditions a caller must not silently continue past.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No calculator is registered under the requested id
    #[error("Calculator not found: {0}")]
    NotFound(String),

    /// `calculate` was called with input that does not pass validation
    #[error("Invalid input for '{calculator_id}': {message}")]
    InvalidInput {
        calculator_id: String,
        message: String,
    },

    /// A result was handed to a calculator that did not produce it
    #[error("Result from '{found}' cannot be interpreted by '{expected}'")]
    Mismatch { expected: String, found: String },

    /// Internal guard tripped during a computation
    #[error("Computation error: {0}")]
    Computation(String),
}
