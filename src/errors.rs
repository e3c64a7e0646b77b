/*!
 * Error types for the promptlens application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a provider API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The HTTP request could not be sent
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Non-success status returned by the API
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error body returned by the API
        message: String,
    },

    /// The response body stream broke while being read
    #[error("Stream error: {0}")]
    StreamError(String),

    /// A header value could not be encoded (for example an API key with control characters)
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        Self::RequestFailed(error.to_string())
    }
}

/// Errors raised while constructing a task request
#[derive(Error, Debug, PartialEq)]
pub enum TaskError {
    /// The selected text was empty
    #[error("No text provided")]
    EmptyText,
}

/// Errors in the persisted configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A remote provider is configured without credentials
    #[error("API key is required for the {0} provider")]
    MissingApiKey(String),

    /// An endpoint override is not a valid URL
    #[error("Invalid endpoint for {provider}: {reason}")]
    InvalidEndpoint {
        /// Provider key the endpoint belongs to
        provider: String,
        /// Parser message
        reason: String,
    },

    /// Target language is not an ISO 639 code
    #[error("Invalid target language: {0}")]
    InvalidLanguage(String),

    /// Mock delay window is inverted
    #[error("Mock delay minimum ({min} ms) exceeds maximum ({max} ms)")]
    InvalidMockDelay {
        /// Lower bound in milliseconds
        min: u64,
        /// Upper bound in milliseconds
        max: u64,
    },
}

/// Errors on the messaging bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The originating context is gone or its channel is closed
    #[error("Relay failed: {0}")]
    RelayFailed(String),

    /// An inbound message could not be decoded
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error in a task request
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Error in the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error on the messaging bridge
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
