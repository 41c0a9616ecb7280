//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Every suspension point of a send:
//!     dial → timeouts.rs (connect deadline)
//!     CONNECT / TLS → timeouts.rs (read + handshake deadlines)
//!     write / read  → timeouts.rs (per-segment deadline)
//!     whole send    → timeouts.rs (optional request deadline)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every socket operation has a deadline
//! - No retries: every error is terminal for the call, the caller decides
//! - A stalled peer fails with a timeout instead of hanging the caller

pub mod timeouts;

pub use timeouts::Timeouts;
