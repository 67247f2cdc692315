//! Error handling for the application

use thiserror::Error;

/// Errors raised while talking to one external price source.
/// These never cross the aggregation boundary: the owning adapter
/// recovers with a synthetic fallback.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source unavailable after {attempts} attempts: {reason}")]
    Unavailable { attempts: u32, reason: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No API credential configured for {0}")]
    MissingCredential(String),
}

/// HTTP transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if let Some(status) = err.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Catalog storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Catalog query failed: {0}")]
    Query(String),

    #[error("Failed to persist analysis: {0}")]
    Persistence(String),
}

/// Errors surfaced by the price analysis engine.
/// `ProductNotFound` is the only client-visible failure.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No catalog product matches '{0}'")]
    ProductNotFound(String),

    #[error("Catalog storage error: {0}")]
    Storage(#[from] StorageError),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Analysis error: {0}")]
    AnalysisError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        AppError::SourceError(err.to_string())
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::SourceError(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Unknown(err.to_string())
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::AnalysisError(err.to_string())
    }
}
