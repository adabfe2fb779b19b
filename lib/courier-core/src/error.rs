//! Error types for courier.
//!
//! [`Error`] separates failures that carry a response ([`Error::Status`]) from those that
//! do not (network, timeout, cancellation, invalid input). [`TransportError`] is the
//! narrower type a [`Transport`](crate::Transport) reports.

use std::time::Duration;

use derive_more::{Display, Error, From};

use crate::{Cancel, Request, RequestConfig, Response};

/// Code attached to timeout errors.
pub const CODE_TIMEOUT: &str = "ECONNABORTED";

/// Code attached to cancellation errors.
pub const CODE_CANCELED: &str = "ERR_CANCELED";

/// Code attached to network errors.
pub const CODE_NETWORK: &str = "ERR_NETWORK";

/// Failure reported by a transport while exchanging a request.
#[derive(Debug, Display, Error)]
pub enum TransportError {
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    Tls(#[error(not(source))] String),

    /// The response body could not be read.
    #[display("body error: {_0}")]
    Body(#[error(not(source))] String),

    /// The request could not be turned into a wire request.
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),
}

impl TransportError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create a body error.
    #[must_use]
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body(message.into())
    }
}

/// Main error type for courier operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The response status was rejected by the status validator.
    #[display("request failed with status code {status}")]
    #[from(skip)]
    Status {
        /// HTTP status code.
        status: u16,
        /// The rejected response.
        response: Box<Response>,
    },

    /// The transport failed before a response was received.
    #[display("network error: {source}")]
    #[from(skip)]
    Network {
        /// Transport failure.
        source: TransportError,
        /// Configuration of the failed request.
        config: Box<RequestConfig>,
        /// The request handed to the transport.
        request: Box<Request>,
    },

    /// The configured timeout elapsed first.
    #[display("timeout of {}ms exceeded", timeout.as_millis())]
    #[from(skip)]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
        /// Configuration of the failed request.
        config: Box<RequestConfig>,
        /// The request handed to the transport.
        request: Box<Request>,
    },

    /// The request's cancel token fired first.
    #[display("{_0}")]
    #[from]
    Canceled(#[error(not(source))] Cancel),

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the request was deliberately canceled.
    #[must_use]
    pub const fn is_cancel(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a network error.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns `true` if the response status was rejected.
    #[must_use]
    pub const fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Machine-readable code, when the failure kind has one.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } => Some(CODE_TIMEOUT),
            Self::Canceled(_) => Some(CODE_CANCELED),
            Self::Network { .. } => Some(CODE_NETWORK),
            _ => None,
        }
    }

    /// Returns the HTTP status code if the status was rejected.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The rejected response, for status errors.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Status { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The cancellation reason, for cancellation errors.
    #[must_use]
    pub const fn cancel(&self) -> Option<&Cancel> {
        match self {
            Self::Canceled(cancel) => Some(cancel),
            _ => None,
        }
    }

    /// Configuration of the failed request, when known.
    #[must_use]
    pub fn config(&self) -> Option<&RequestConfig> {
        match self {
            Self::Status { response, .. } => Some(response.config()),
            Self::Network { config, .. } | Self::Timeout { config, .. } => Some(config),
            _ => None,
        }
    }

    /// The request handed to the transport, when one was created.
    #[must_use]
    pub fn request(&self) -> Option<&Request> {
        match self {
            Self::Status { response, .. } => Some(response.request()),
            Self::Network { request, .. } | Self::Timeout { request, .. } => Some(request),
            _ => None,
        }
    }
}
