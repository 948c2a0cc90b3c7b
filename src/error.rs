//! Error types for drive115-dl
//!
//! Every fallible operation in the crate returns [`Result`]. Errors fall into
//! three families that a host surfaces unchanged:
//! - transport failures from the HTTP layer ([`Error::Network`])
//! - application failures where an endpoint answered but reported a logical
//!   failure ([`Error::Api`]), carrying the raw response body for diagnosis
//! - operations this crate does not implement ([`Error::NotSupported`])
//!
//! Nothing is retried or recovered locally.

use thiserror::Error;

/// Result type alias for drive115-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for drive115-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "drive.page_size")
        key: Option<String>,
    },

    /// The endpoint answered but signalled a logical failure (`state: false`,
    /// a failed batch element, an unparsable body)
    #[error("115 API error: {body}")]
    Api {
        /// URL of the endpoint that reported the failure
        endpoint: String,
        /// The raw response body, as received
        body: serde_json::Value,
    },

    /// Credentials were rejected by the service's probe endpoint
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Network or HTTP transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Feed could not be fetched or parsed
    #[error("feed error: {0}")]
    Feed(String),

    /// Feed host refused the connection
    #[error("It was not possible to connect to the URL. Please make sure the URL \"{url}\" it is valid!")]
    FeedUnreachable {
        /// The feed URL that could not be reached
        url: String,
    },

    /// Static data persistence failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// An OpenAI-compatible endpoint answered with a body that is not JSON
    #[error("OpenAI-compatible API error: {body}")]
    Provider {
        /// URL of the endpoint
        endpoint: String,
        /// The raw response text
        body: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation not supported by this crate
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl Error {
    /// Build an application error from an endpoint and the body it returned
    pub fn api(endpoint: impl Into<String>, body: serde_json::Value) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            body,
        }
    }

    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code
    ///
    /// Hosts can use this for programmatic error handling without matching on
    /// the display text.
    pub fn code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Api { .. } => "api_error",
            Error::InvalidCredentials(_) => "invalid_credentials",
            Error::Network(_) => "network_error",
            Error::Feed(_) => "feed_error",
            Error::FeedUnreachable { .. } => "feed_unreachable",
            Error::Database(_) => "database_error",
            Error::Provider { .. } => "provider_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotSupported(_) => "not_supported",
            Error::Other(_) => "internal_error",
        }
    }

    /// Whether this error came from the transport layer rather than the
    /// remote application
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Network(_) | Error::FeedUnreachable { .. })
    }
}
