//! Transport error taxonomy.
//!
//! Every variant is terminal for the `send` call that produced it. The
//! transport never retries; callers decide what to do with each kind.
//! A non-2xx final response is not an error and never appears here.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Suspension point at which a deadline expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// TCP connect to the origin or proxy.
    Dial,
    /// TLS handshake (direct or through a tunnel).
    Handshake,
    /// Writing the request bytes.
    Write,
    /// Reading a response head, body segment or chunk.
    Read,
    /// Overall per-request deadline.
    Request,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Dial => "dial",
            Phase::Handshake => "handshake",
            Phase::Write => "write",
            Phase::Read => "read",
            Phase::Request => "request",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while sending a request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The origin or proxy could not be reached.
    #[error("Failed to connect to {authority}: {source}")]
    Dial {
        authority: String,
        #[source]
        source: std::io::Error,
    },

    /// TLS negotiation or certificate validation failed.
    #[error("TLS handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    /// The proxy answered the CONNECT request with a non-2xx status.
    #[error("Proxy refused CONNECT to {authority}: {status} {reason}")]
    ProxyConnect {
        authority: String,
        status: u16,
        reason: String,
    },

    /// Malformed status line, header, chunk framing or `Location`.
    #[error("{0}")]
    Parse(String),

    /// The request cannot be serialized.
    #[error("Cannot encode request: {0}")]
    Encoding(String),

    /// A suspension point exceeded its deadline.
    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: Phase, after: Duration },

    /// The redirect bound was exceeded.
    #[error("Too many redirects (limit {max})")]
    TooManyRedirects { max: u32 },

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// Socket failure on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Short, stable name used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Dial { .. } => "dial",
            TransportError::Handshake { .. } => "handshake",
            TransportError::ProxyConnect { .. } => "proxy_connect",
            TransportError::Parse(_) => "parse",
            TransportError::Encoding(_) => "encoding",
            TransportError::Timeout { .. } => "timeout",
            TransportError::TooManyRedirects { .. } => "too_many_redirects",
            TransportError::Cancelled => "cancelled",
            TransportError::Io(_) => "io",
        }
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        TransportError::Parse(msg.into())
    }

    pub(crate) fn encoding(msg: impl Into<String>) -> Self {
        TransportError::Encoding(msg.into())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_names_phase() {
        let err = TransportError::Timeout {
            phase: Phase::Handshake,
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "handshake timed out after 250ms");
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn proxy_connect_carries_status() {
        let err = TransportError::ProxyConnect {
            authority: "another.server.com:443".into(),
            status: 403,
            reason: "Forbidden".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403 Forbidden"));
        assert!(msg.contains("another.server.com:443"));
    }
}
