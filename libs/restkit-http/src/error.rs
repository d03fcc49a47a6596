use std::time::Duration;
use thiserror::Error;

/// Classification of URL validation failures.
///
/// Provides programmatic matching for different failure modes without
/// relying on unstable error message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// URL could not be parsed (malformed syntax)
    ParseError,
    /// URL is relative and no base URL is configured
    MissingBaseUrl,
    /// URL is missing required host/authority component
    MissingAuthority,
}

/// Errors raised while preparing, sending, or reading a REST call.
///
/// The verb helpers on [`RestClient`](crate::RestClient) never return this
/// type; they fold it into a failed [`ApiResult`](crate::ApiResult) with
/// status 500. It surfaces directly only from client construction.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RestError {
    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Invalid URL
    ///
    /// Use the `kind` field for programmatic matching. The `reason` field
    /// is diagnostic only.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri {
        url: String,
        kind: InvalidUriKind,
        reason: String,
    },

    /// URL scheme rejected by the transport security configuration
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme { scheme: String, reason: String },

    /// JSON serialization or deserialization failed
    #[error("JSON processing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading an upload stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response or upload body exceeded the size limit
    #[error("Body too large: limit {limit} bytes, got at least {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Upload part content type is not a valid media type
    #[error("Invalid content type '{value}': {source}")]
    InvalidContentType {
        value: String,
        #[source]
        source: mime::FromStrError,
    },

    /// Request attempt timed out
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport error (network, connection, body stream, etc)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The call was cancelled through its cancellation token
    #[error("The operation was canceled")]
    Cancelled,
}

impl From<hyper::Error> for RestError {
    fn from(err: hyper::Error) -> Self {
        RestError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for RestError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        RestError::Transport(Box::new(err))
    }
}

impl RestError {
    /// Map a boxed tower error, recovering a `RestError` produced by an inner
    /// layer before falling back to `Transport`.
    pub(crate) fn from_boxed(err: tower::BoxError) -> Self {
        match err.downcast::<RestError>() {
            Ok(rest_err) => *rest_err,
            Err(other) => RestError::Transport(other),
        }
    }
}
