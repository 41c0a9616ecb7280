//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check URLs: base URL is http(s), proxy is a plain-HTTP proxy
//! - Validate value ranges (timeouts > 0)
//! - Check that referenced files exist
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TransportConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the client

use std::fmt;
use std::path::Path;

use url::Url;

use crate::config::schema::TransportConfig;
use crate::routing::{Proxy, Scheme};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &TransportConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.base_url) {
        Ok(url) => {
            if Scheme::parse(url.scheme()).is_none() {
                errors.push(ValidationError::new(
                    "base_url",
                    format!("unsupported scheme {:?}", url.scheme()),
                ));
            }
            if url.host_str().map_or(true, str::is_empty) {
                errors.push(ValidationError::new("base_url", "missing host"));
            }
        }
        Err(e) => errors.push(ValidationError::new("base_url", format!("invalid URL: {e}"))),
    }

    if let Some(proxy) = &config.proxy {
        if let Err(e) = Proxy::parse(proxy) {
            errors.push(ValidationError::new("proxy", e));
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_ms", timeouts.connect_ms),
        ("timeouts.handshake_ms", timeouts.handshake_ms),
        ("timeouts.read_ms", timeouts.read_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if let Some(path) = &config.tls.ca_cert_path {
        if !Path::new(path).exists() {
            errors.push(ValidationError::new(
                "tls.ca_cert_path",
                format!("file not found: {path}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&TransportConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = TransportConfig::with_base_url("ftp://files.example.com");
        config.proxy = Some("socks5://127.0.0.1:1080".to_string());
        config.timeouts.read_ms = 0;
        config.tls.ca_cert_path = Some("/definitely/not/here.pem".to_string());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["base_url", "proxy", "timeouts.read_ms", "tls.ca_cert_path"]
        );
    }

    #[test]
    fn unparseable_base_url() {
        let config = TransportConfig::with_base_url("not a url");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("base_url: invalid URL"));
    }
}
