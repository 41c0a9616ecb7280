//! HTTP message and wire subsystem.
//!
//! # Data Flow
//! ```text
//! Request (method, target, headers, body)
//!     → codec.rs (request line + Host + framing → bytes)
//!     → [net layer writes bytes, hands back a buffered reader]
//!     → codec.rs (status line + headers)
//!     → body.rs (Content-Length / chunked / close-delimited)
//!     → Response (status, headers, body, trailers)
//! ```

pub mod body;
pub mod codec;
pub mod headers;
pub mod request;
pub mod response;

pub use codec::{encode_request, read_request, read_response, read_response_head, ResponseHead};
pub use headers::Headers;
pub use request::{Request, JSON_CONTENT_TYPE};
pub use response::{Response, Version};
