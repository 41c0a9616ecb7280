//! Outgoing request value.
//!
//! # Responsibilities
//! - Carry method, target, headers and body for one `send`
//! - Normalize the method to upper case
//! - Provide JSON convenience constructors for command payloads

use serde::Serialize;

use crate::error::{TransportError, TransportResult};
use crate::http::Headers;

/// Media type sent with JSON command payloads.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// An HTTP request described as plain data.
///
/// `target` is either an absolute `http(s)` URL or a path that the client
/// resolves against its configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: impl AsRef<str>, target: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            target: target.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new("GET", target)
    }

    pub fn post(target: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new("POST", target).with_body(body)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new("DELETE", target)
    }

    /// Build a request whose body is `payload` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(
        method: impl AsRef<str>,
        target: impl Into<String>,
        payload: &T,
    ) -> TransportResult<Self> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| TransportError::encoding(format!("JSON payload: {e}")))?;
        Ok(Self::new(method, target)
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_body(body))
    }

    /// Set a header, replacing existing entries with the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// True for methods whose redirects never change the method.
    pub fn is_safe_method(&self) -> bool {
        self.method == "GET" || self.method == "HEAD"
    }

    /// Check the send-time invariants: non-empty method and target.
    pub fn validate(&self) -> TransportResult<()> {
        if self.method.is_empty() {
            return Err(TransportError::encoding("request method is empty"));
        }
        if !self.method.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-' || b == b'_') {
            return Err(TransportError::encoding(format!(
                "invalid request method {:?}",
                self.method
            )));
        }
        if self.target.trim().is_empty() {
            return Err(TransportError::encoding("request target is empty"));
        }
        Ok(())
    }
}
