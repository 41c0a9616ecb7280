//! Per-request connection and its lifecycle.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Hide plain vs. TLS behind one byte stream
//! - Buffer reads for the codec while writes pass straight through
//! - Close the socket on every exit path (drop), and track open connections

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::error::{Phase, TransportResult};
use crate::observability::metrics;
use crate::resilience::timeouts::io_deadline;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Socket as seen by the codec: plain TCP or TLS over TCP (possibly tunneled).
#[derive(Debug)]
pub enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Stream {
    pub fn is_tls(&self) -> bool {
        matches!(self, Stream::Tls(_))
    }
}

impl AsyncRead for Stream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_flush(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// A live connection owned by exactly one in-flight request.
///
/// Dropping it closes the socket and decrements the open-connection gauge.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    peer: String,
    io: BufReader<Stream>,
}

impl Connection {
    pub fn new(stream: Stream, peer: String) -> Self {
        let id = ConnectionId::new();
        metrics::connection_opened();
        tracing::trace!(connection_id = %id, peer = %peer, tls = stream.is_tls(), "Connection opened");
        Self {
            id,
            peer,
            io: BufReader::new(stream),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Socket peer: the origin, or the proxy for proxied routes.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_tls(&self) -> bool {
        self.io.get_ref().is_tls()
    }

    /// Write all bytes and flush, under a write deadline.
    pub async fn write_all(&mut self, bytes: &[u8], limit: Duration) -> TransportResult<()> {
        let io = &mut self.io;
        io_deadline(Phase::Write, limit, async move {
            io.write_all(bytes).await?;
            io.flush().await
        })
        .await
    }

    /// Buffered reader for the codec.
    pub fn reader(&mut self) -> &mut BufReader<Stream> {
        &mut self.io
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        metrics::connection_closed();
        tracing::trace!(connection_id = %self.id, peer = %self.peer, "Connection closed");
    }
}
