//! Client subsystem.
//!
//! # Data Flow
//! ```text
//! Request (relative or absolute target)
//!     → http_client.rs (defaults, base URL resolution)
//!     → routing (Target + Route)
//!     → net (connect: direct, forward, or CONNECT tunnel + TLS)
//!     → http codec (encode, write, read response)
//!     → redirect.rs (3xx? build next request, loop)
//!     → Response (final hop)
//! ```
//!
//! # Design Decisions
//! - `send` is a strictly sequential future; concurrency is the caller's
//! - Cancellation is dropping the future, or `send_until` with a `CancelSignal`
//! - `blocking::Client` serves synchronous callers

pub mod blocking;
pub mod cancel;
pub mod http_client;
pub mod redirect;

pub use cancel::CancelSignal;
pub use http_client::{default_user_agent, HttpClient, RedirectPolicy};
