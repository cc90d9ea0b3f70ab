//! Error types for the VMS client
//!
//! Every failure surfaces to the immediate caller as an [`Error`] value. The
//! variants that callers are expected to branch on (`NotFound`, `Ambiguous`,
//! `VersionIncompatible`) are distinct so no string matching is ever needed.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for operations that can fail with a client error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the VMS client.
#[derive(Debug, Error)]
pub enum Error {
    /// A `get` matched zero records.
    #[error("resource '{resource}' not found for params '{query}'")]
    NotFound {
        /// Resource path that was queried
        resource: String,
        /// Encoded query string that produced no match
        query: String,
    },

    /// A `get` matched more than one record.
    #[error("more than one resource '{resource}' found for params '{query}'")]
    Ambiguous {
        /// Resource path that was queried
        resource: String,
        /// Encoded query string that matched several records
        query: String,
    },

    /// The connected cluster is older than the resource's minimum version.
    #[error(
        "resource {resource:?} is not supported in VAST cluster version {cluster_version} (supported from version {required})"
    )]
    VersionIncompatible {
        /// Resource kind name
        resource: String,
        /// Core version reported by the cluster
        cluster_version: semver::Version,
        /// Minimum version declared by the resource
        required: semver::Version,
    },

    /// The cluster version string could not be resolved or parsed.
    #[error("Invalid cluster version: {0}")]
    InvalidVersion(String),

    /// Token acquisition or refresh failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Missing required configuration (host, credentials, ...).
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// The server could not be reached at all.
    #[error("server unreachable: verify the host is correct and the network is accessible ({0})")]
    ServerUnreachable(String),

    /// The server answered with a non-2xx status code.
    #[error("invalid status code {status}, err: {body}")]
    Status {
        /// HTTP status code
        status: http::StatusCode,
        /// Response body, pretty-printed when it is JSON
        body: String,
        /// Headers of the rejected response
        headers: http::HeaderMap,
    },

    /// Network or connection error other than an unreachable host.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout.
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// The dispatcher was asked for a verb it does not support.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// Invalid URL produced from configuration and path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A before/after request interceptor rejected the call.
    #[error("Request interceptor rejected the call: {0}")]
    Interceptor(String),

    /// Failed to decode a response body into the expected shape.
    #[error("Failed to decode {expected} from response: {message}")]
    Decode {
        /// Expected response shape
        expected: &'static str,
        /// Underlying decode error
        message: String,
    },

    /// A record is missing a usable field (e.g. `id`).
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// An asynchronous task reached a terminal non-completed state.
    #[error("task {name} failed with ID {id}: {reason}")]
    TaskFailed {
        /// Task name
        name: String,
        /// Task identifier
        id: i64,
        /// Last message reported by the task
        reason: String,
    },

    /// The messages of a failed task were not a list.
    #[error("unexpected message format for task {id}: {found}")]
    TaskMessages {
        /// Task identifier
        id: i64,
        /// JSON type that was found instead of a list
        found: String,
    },

    /// The task did not complete within the poll budget.
    #[error("task {id} did not complete in time ({attempts} attempts)")]
    TaskTimeout {
        /// Task identifier
        id: i64,
        /// Number of polls performed
        attempts: u32,
    },

    /// The operation was cancelled through its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,

    /// HTTP client configuration or initialization error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Invalid HTTP header value.
    #[error("Invalid HTTP header value: {0}")]
    InvalidHeaderValue(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// Context description
        context: String,
        /// Underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Other errors not covered by specific variants.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Check if this is a [`Error::NotFound`] from a `get`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this error is transient and the call may be repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ServerUnreachable(_) | Error::Connection(_) | Error::Timeout(_) => true,
            Error::Status { status, .. } => {
                status.is_server_error() || *status == http::StatusCode::REQUEST_TIMEOUT
            }
            _ => false,
        }
    }

    /// HTTP status of a rejected response, if any.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Add context to an error.
    pub fn context<C>(self, context: C) -> Self
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        Error::WithContext {
            context: context.to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn decode<E: std::fmt::Display>(expected: &'static str, err: E) -> Self {
        Error::Decode {
            expected,
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Error::ServerUnreachable(err.to_string())
        } else if err.is_builder() {
            Error::HttpClient(err.to_string())
        } else {
            Error::Connection(err.to_string())
        }
    }
}
