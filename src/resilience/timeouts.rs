//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every suspension point (dial, handshake, write, read) with a deadline
//! - Refresh the read deadline per segment so a slow but live peer is fine
//! - Report which phase expired
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Expiry drops the inner future, which releases whatever it borrowed

use std::future::Future;
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::error::{Phase, TransportError, TransportResult};

/// Per-phase deadlines for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub handshake: Duration,
    pub read: Duration,
    /// Overall deadline for one `send`, redirects included.
    pub request: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts::from(&TimeoutConfig::default())
    }
}

impl From<&TimeoutConfig> for Timeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_millis(config.connect_ms),
            handshake: Duration::from_millis(config.handshake_ms),
            read: Duration::from_millis(config.read_ms),
            request: (config.request_ms > 0).then(|| Duration::from_millis(config.request_ms)),
        }
    }
}

/// Run `fut` under a deadline, mapping expiry to `TransportError::Timeout`.
pub async fn with_deadline<T, F>(phase: Phase, limit: Duration, fut: F) -> TransportResult<T>
where
    F: Future<Output = TransportResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(phase = %phase, limit = ?limit, "Deadline expired");
            Err(TransportError::Timeout { phase, after: limit })
        }
    }
}

/// Socket I/O under a deadline; I/O failures become `TransportError::Io`.
pub async fn io_deadline<T, F>(phase: Phase, limit: Duration, fut: F) -> TransportResult<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    with_deadline(phase, limit, async { fut.await.map_err(TransportError::from) }).await
}

/// Like `with_deadline`, but a `None` limit means no deadline.
pub async fn maybe_deadline<T, F>(phase: Phase, limit: Option<Duration>, fut: F) -> TransportResult<T>
where
    F: Future<Output = TransportResult<T>>,
{
    match limit {
        Some(limit) => with_deadline(phase, limit, fut).await,
        None => fut.await,
    }
}
