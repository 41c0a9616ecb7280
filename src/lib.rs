//! Minimal HTTP/1.1 client transport for talking to a remote end.
//!
//! Sends one request per connection, directly, through a forward proxy, or
//! through a CONNECT tunnel with TLS to the target, and follows redirects.
//!
//! ```no_run
//! use remote_transport::{HttpClient, Request, TransportConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(TransportConfig::with_base_url("http://localhost:4444/wd/hub"))?;
//! let response = client.send(Request::get("/status")).await?;
//! println!("{} {}", response.status, response.text());
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use client::{blocking, CancelSignal, HttpClient, RedirectPolicy};
pub use config::schema::TransportConfig;
pub use error::{Phase, TransportError, TransportResult};
pub use http::{Headers, Request, Response};
