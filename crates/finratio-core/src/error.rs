//! Error types for collection operations.
//!
//! This module defines [`CollectError`] which covers all error cases that can occur
//! when fetching statements, recording completed work, or archiving raw payloads.

use thiserror::Error;

/// Errors that can occur during collection.
#[derive(Error, Debug)]
pub enum CollectError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// Authentication or authorization failed for a provider.
    #[error("Authentication failed for provider {0}")]
    AuthenticationFailed(String),

    /// The requested company could not be resolved to a provider identifier.
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// The provider answered with a non-success status.
    #[error("API error [{status}]: {message}")]
    Api {
        /// Provider status code.
        status: String,
        /// Provider message.
        message: String,
    },

    /// Error parsing a provider response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error reading or writing the completion ledger.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Error writing to an output or archive sink.
    #[error("Sink error: {0}")]
    Sink(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl CollectError {
    /// Returns true for errors raised by the transport to the statement provider.
    ///
    /// These are the errors a single task converts into a failed outcome.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::RateLimited { .. }
                | Self::AuthenticationFailed(_)
                | Self::CompanyNotFound(_)
                | Self::Api { .. }
                | Self::Parse(_)
        )
    }
}

/// Result type alias using [`CollectError`].
pub type Result<T> = std::result::Result<T, CollectError>;
