//! Synchronous facade over [`HttpClient`].

use tokio::runtime::{Builder, Runtime};

use crate::client::http_client::{HttpClient, RedirectPolicy};
use crate::config::{ConfigError, TransportConfig};
use crate::error::TransportResult;
use crate::http::{Request, Response};

/// Blocking client that drives sends on its own current-thread runtime.
///
/// Must not be used from inside an async context.
#[derive(Debug)]
pub struct Client {
    inner: HttpClient,
    runtime: Runtime,
}

impl Client {
    pub fn new(config: TransportConfig) -> Result<Self, ConfigError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ConfigError::Io)?;
        Ok(Self {
            inner: HttpClient::new(config)?,
            runtime,
        })
    }

    pub fn send(&self, request: Request) -> TransportResult<Response> {
        self.runtime.block_on(self.inner.send(request))
    }

    pub fn send_with_redirects(&self, request: Request, max_redirects: u32) -> TransportResult<Response> {
        self.runtime
            .block_on(self.inner.send_with_policy(request, RedirectPolicy::Limited(max_redirects)))
    }

    /// The async client underneath; clones share its configuration.
    pub fn async_client(&self) -> &HttpClient {
        &self.inner
    }
}
