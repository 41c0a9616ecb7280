//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request target (absolute URL or base-relative path)
//!     → target.rs (resolve to Target: scheme, host, port, path)
//!     → route.rs (pick Direct / Forward / Tunnel from proxy config)
//!     → Return: route + request-line form for the wire codec
//! ```
//!
//! # Design Decisions
//! - Two host concepts stay separate: `Proxy` for the outer socket, `Target`
//!   for `Host`, SNI and the request line
//! - Route is recomputed for every hop, so redirects across schemes pick the
//!   right path through the proxy
//! - Deterministic: same target and proxy always yield the same route

pub mod route;
pub mod target;

pub use route::Route;
pub use target::{Proxy, Scheme, Target};
