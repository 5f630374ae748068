//! Error types for rabbitmq-zabbix
//!
//! This module defines the error types used throughout the application.
//! Lookup misses (unknown node, missing field) are not errors: they are
//! reported to Zabbix as sentinel values instead.

use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Invalid filter specification
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Broker communication error
    #[error("Collector error: {0}")]
    Collector(#[from] CollectorError),

    /// Metric delivery error
    #[error("Sender error: {0}")]
    Sink(#[from] SinkError),

    /// The `server` check was requested without a metric name
    #[error("Missing required parameter: \"metric\"")]
    MissingMetric,

    /// Failed to render check output
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Filter specification errors
#[derive(Error, Debug)]
pub enum FilterError {
    /// The filter string is not valid JSON
    #[error("Invalid filters object: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// A predicate inside the filter list is not a JSON object
    #[error("Invalid filter predicate at index {index}: expected an object, got {found}")]
    InvalidPredicate { index: usize, found: String },
}

/// Errors raised while talking to the RabbitMQ management API
#[derive(Error, Debug)]
pub enum CollectorError {
    /// HTTP client initialization failed
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// The management API base URL could not be built
    #[error("Invalid management API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// Reading the HTTP response failed
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    /// The response body is not the JSON we expected
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// The configured timeout in milliseconds, if known.
    #[error("Request timed out{}", .0.map(|ms| format!(" after {}ms", ms)).unwrap_or_default())]
    Timeout(Option<u64>),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The broker rejected the credentials
    #[error("Authentication failed")]
    AuthenticationFailed,
}

impl CollectorError {
    /// HTTP status code carried by this error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CollectorError::HttpStatus(code) => Some(*code),
            CollectorError::AuthenticationFailed => Some(401),
            _ => None,
        }
    }

    /// Whether the broker answered 404 for the requested resource
    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(404)
    }

    /// Create a Timeout error with known duration
    pub fn timeout_with_duration(ms: u64) -> Self {
        CollectorError::Timeout(Some(ms))
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured duration here; callers that
            // know it use CollectorError::timeout_with_duration().
            CollectorError::Timeout(None)
        } else if err.is_connect() {
            CollectorError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            CollectorError::HttpRequest(err)
        } else {
            CollectorError::HttpResponse(err)
        }
    }
}

/// Errors raised while handing a batch to the sender process
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sender binary could not be started
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the batch or collecting the exit status failed
    #[error("Sender I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sender exited without an exit code
    #[error("Sender '{program}' was terminated by a signal")]
    Terminated { program: String },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
