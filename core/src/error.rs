//! Error types for the gym API client.
//!
//! # Design
//! Build-time failures (`MissingPathParameter`, `MissingCredentials`,
//! `InvalidRequest`, `Serialization`) are raised before any I/O. Transport
//! failures keep their own variants so callers can tell "the server answered
//! with an error" apart from "the server did not answer". A remote non-2xx
//! answer becomes `Status`, whose payload only the error mapper constructs.
//! The blocking and async paths return exactly the same variants.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthScheme;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Connection-level failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Host name could not be resolved.
    Dns,
    /// TCP connection could not be established.
    Connect,
    /// Connection dropped mid-exchange.
    Reset,
    /// TLS handshake or certificate failure.
    Tls,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Reset => "reset",
            Self::Tls => "tls",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A non-2xx answer from the API.
///
/// Only [`crate::mapper::error_for_status`] creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    status: u16,
    reason: String,
    body: Option<String>,
}

impl StatusError {
    pub(crate) fn new(status: u16, reason: String, body: Option<String>) -> Self {
        Self {
            status,
            reason,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Raw response body, if the server sent one.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} {}", self.status, self.reason)?;
        if let Some(body) = &self.body {
            write!(f, ": {body}")?;
        }
        Ok(())
    }
}

/// Errors returned by every client operation, in both execution modes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing path parameter `{name}` for `{template}`")]
    MissingPathParameter { name: String, template: String },

    #[error("resource path `{path}` still contains a placeholder")]
    UnresolvedPlaceholder { path: String },

    #[error("operation requires {scheme} credentials but none are configured")]
    MissingCredentials { scheme: AuthScheme },

    /// Bad base URL, header name or header value.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("request timed out after {elapsed:?}")]
    TransportTimeout { elapsed: Duration },

    #[error("transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    /// The body parsed, but not into the declared response shape.
    #[error("unexpected response shape: expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: String,
    },

    /// The body was not valid JSON, or a field had the wrong type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("{0}")]
    Status(StatusError),

    #[error("call was cancelled")]
    Cancelled,
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Build,
    Auth,
    Timeout,
    Connection,
    Decode,
    Status,
    Cancelled,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingPathParameter { .. }
            | Self::UnresolvedPlaceholder { .. }
            | Self::InvalidRequest(_)
            | Self::Serialization(_) => ErrorKind::Build,
            Self::MissingCredentials { .. } => ErrorKind::Auth,
            Self::TransportTimeout { .. } => ErrorKind::Timeout,
            Self::Transport { .. } => ErrorKind::Connection,
            Self::UnexpectedShape { .. } | Self::Deserialization(_) => ErrorKind::Decode,
            Self::Status(_) => ErrorKind::Status,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// The engine never retries on its own; this is advice for the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportTimeout { .. } | Self::Transport { .. } => true,
            Self::Status(err) => err.status == 429 || err.status >= 500,
            _ => false,
        }
    }

    /// HTTP status of a remote error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(err) => Some(err.status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
