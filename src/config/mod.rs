//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or TransportConfig built in code
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TransportConfig (validated, immutable)
//!     → shared via Arc by every clone of the client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a client is built; concurrent sends share it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::RedirectConfig;
pub use schema::TimeoutConfig;
pub use schema::TlsConfig;
pub use schema::TransportConfig;
