//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Target + Route (from routing)
//!     → connector.rs (dial origin or proxy, connect deadline)
//!     → connector.rs (CONNECT host:port, only for Tunnel routes)
//!     → tls.rs (optional TLS handshake, SNI = target host)
//!     → connection.rs (owned stream, ID, closes on drop)
//!     → Hand off to the wire codec
//!
//! Connection States:
//!     Dialing → Tunneling → Handshaking → Active → Closed
//! ```
//!
//! # Design Decisions
//! - Each connection belongs to one request; nothing is pooled or shared
//! - TLS is optional and handled transparently behind `Stream`
//! - Every step is awaited in sequence; the layer never spawns tasks

pub mod connection;
pub mod connector;
pub mod tls;

pub use connection::{Connection, ConnectionId, Stream};
pub use connector::Connector;
pub use tls::TlsClient;
