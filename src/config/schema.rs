//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the transport.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the transport client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL of the remote end (e.g., "http://localhost:4444/wd/hub").
    /// Relative request targets are appended to its path.
    pub base_url: String,

    /// Optional forward proxy (e.g., "http://proxy.internal:3128").
    pub proxy: Option<String>,

    /// Redirect following policy.
    pub redirects: RedirectConfig,

    /// TLS policy.
    pub tls: TlsConfig,

    /// Deadlines for each suspension point.
    pub timeouts: TimeoutConfig,

    /// Override for the default `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4444".to_string(),
            proxy: None,
            redirects: RedirectConfig::default(),
            tls: TlsConfig::default(),
            timeouts: TimeoutConfig::default(),
            user_agent: None,
        }
    }
}

impl TransportConfig {
    /// Defaults with the given base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Redirect following configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RedirectConfig {
    /// Follow 301/302/303/307/308 responses.
    pub follow: bool,

    /// Maximum redirects followed by one send.
    pub max: u32,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            follow: true,
            max: 20,
        }
    }
}

/// TLS configuration for outgoing connections.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// Skip certificate validation. Testing only.
    pub accept_invalid_certs: bool,

    /// Extra PEM file of trusted CA certificates.
    pub ca_cert_path: Option<String>,
}

/// Timeout configuration, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TCP connect timeout.
    pub connect_ms: u64,

    /// TLS handshake timeout.
    pub handshake_ms: u64,

    /// Per-read deadline, refreshed for every segment or chunk.
    pub read_ms: u64,

    /// Overall deadline for one send including redirects (0 = none).
    pub request_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 10_000,
            handshake_ms: 10_000,
            read_ms: 30_000,
            request_ms: 0,
        }
    }
}
