//! Connection establishment.
//!
//! # Responsibilities
//! - Dial the origin or the proxy under the connect deadline
//! - Issue `CONNECT host:port` for secure targets behind a proxy
//! - Run the TLS handshake against the target, directly or through the tunnel
//!
//! # Design Decisions
//! - One connection per hop; a fresh CONNECT for every hop (no tunnel reuse)
//! - The proxy authority only ever names the socket peer; `Host` and SNI use
//!   the target
//! - A refused CONNECT fails before any TLS byte is written

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{Phase, TransportError, TransportResult};
use crate::http::codec::read_response_head;
use crate::net::connection::{Connection, Stream};
use crate::net::tls::TlsClient;
use crate::resilience::timeouts::{io_deadline, with_deadline};
use crate::resilience::Timeouts;
use crate::routing::{Proxy, Route, Target};

/// Produces connected streams for targets. Immutable; shared by all sends.
#[derive(Debug, Clone)]
pub struct Connector {
    proxy: Option<Proxy>,
    tls: TlsClient,
    timeouts: Timeouts,
}

impl Connector {
    pub fn new(proxy: Option<Proxy>, tls: TlsClient, timeouts: Timeouts) -> Self {
        Self { proxy, tls, timeouts }
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    /// Route a target through this connector's proxy configuration.
    pub fn route(&self, target: &Target) -> Route<'_> {
        Route::select(target, self.proxy.as_ref())
    }

    /// Open a connection to `target` along `route`.
    pub async fn connect(&self, target: &Target, route: Route<'_>) -> TransportResult<Connection> {
        match route {
            Route::Direct => {
                let tcp = self.dial(target.host(), target.port()).await?;
                let peer = target.authority();
                if target.scheme().is_secure() {
                    let tls = self.tls.handshake(tcp, target, self.timeouts.handshake).await?;
                    tracing::debug!(target = %peer, "TLS established");
                    Ok(Connection::new(Stream::Tls(Box::new(tls)), peer))
                } else {
                    Ok(Connection::new(Stream::Plain(tcp), peer))
                }
            }
            Route::Forward(proxy) => {
                let tcp = self.dial(proxy.host(), proxy.port()).await?;
                tracing::debug!(proxy = %proxy.authority(), target = %target.authority(), "Forwarding through proxy");
                Ok(Connection::new(Stream::Plain(tcp), proxy.authority()))
            }
            Route::Tunnel(proxy) => {
                let mut tcp = self.dial(proxy.host(), proxy.port()).await?;
                self.open_tunnel(&mut tcp, proxy, target).await?;
                let tls = self.tls.handshake(tcp, target, self.timeouts.handshake).await?;
                tracing::debug!(proxy = %proxy.authority(), target = %target.authority(), "TLS established through tunnel");
                Ok(Connection::new(Stream::Tls(Box::new(tls)), proxy.authority()))
            }
        }
    }

    async fn dial(&self, host: &str, port: u16) -> TransportResult<TcpStream> {
        let authority = format!("{host}:{port}");
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        tracing::debug!(authority = %authority, "Dialing");

        let stream = with_deadline(Phase::Dial, self.timeouts.connect, async {
            TcpStream::connect((bare_host, port))
                .await
                .map_err(|source| TransportError::Dial {
                    authority: authority.clone(),
                    source,
                })
        })
        .await?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::trace!(error = %e, "Failed to set TCP_NODELAY");
        }
        Ok(stream)
    }

    /// Ask the proxy for a raw tunnel to `target` and wait for its 2xx.
    async fn open_tunnel(&self, tcp: &mut TcpStream, proxy: &Proxy, target: &Target) -> TransportResult<()> {
        let authority = target.authority();
        let mut head = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
        if let Some(auth) = proxy.authorization() {
            head.push_str(&format!("Proxy-Authorization: {auth}\r\n"));
        }
        head.push_str("\r\n");

        io_deadline(Phase::Write, self.timeouts.read, tcp.write_all(head.as_bytes())).await?;

        let mut reader = BufReader::new(&mut *tcp);
        let response = read_response_head(&mut reader, self.timeouts.read).await?;
        if !(200..300).contains(&response.status) {
            tracing::warn!(
                proxy = %proxy.authority(),
                target = %authority,
                status = response.status,
                reason = %response.reason,
                "Proxy refused CONNECT"
            );
            return Err(TransportError::ProxyConnect {
                authority,
                status: response.status,
                reason: response.reason,
            });
        }
        if !reader.buffer().is_empty() {
            return Err(TransportError::parse(format!(
                "Unexpected {} bytes after CONNECT response from {}",
                reader.buffer().len(),
                proxy.authority()
            )));
        }

        tracing::debug!(proxy = %proxy.authority(), target = %authority, status = response.status, "Tunnel established");
        Ok(())
    }
}
