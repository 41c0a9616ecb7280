//! Target and proxy authorities.
//!
//! # Design Decisions
//! - `Target` is the true destination: it feeds the `Host` header, TLS SNI and
//!   the request line
//! - `Proxy` is only ever the outer socket peer; it never leaks into `Host` or SNI
//! - Both keep host and port explicit so the two cannot be confused

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{TransportError, TransportResult};

/// URL scheme understood by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn parse(scheme: &str) -> Option<Self> {
        match scheme {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            _ => None,
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Scheme::Https)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved destination of one hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Target {
    /// Build a target from an absolute URL.
    pub fn from_url(url: Url) -> TransportResult<Self> {
        let scheme = Scheme::parse(url.scheme()).ok_or_else(|| {
            TransportError::encoding(format!("unsupported URL scheme {:?} in {url}", url.scheme()))
        })?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TransportError::encoding(format!("URL has no host: {url}")))?
            .to_string();
        let port = url.port().unwrap_or_else(|| scheme.default_port());
        Ok(Self {
            url,
            scheme,
            host,
            port,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host as written in the URL (IPv6 literals keep their brackets).
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, always with the port.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value for the `Host` header; the port is omitted when it is the default.
    pub fn host_header(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            self.authority()
        }
    }

    /// Name presented for TLS SNI and certificate validation.
    pub fn server_name(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// Path plus query, optionally followed by the fragment.
    pub fn origin_form(&self, keep_fragment: bool) -> String {
        let mut out = self.url.path().to_string();
        if out.is_empty() {
            out.push('/');
        }
        if let Some(query) = self.url.query() {
            out.push('?');
            out.push_str(query);
        }
        if keep_fragment {
            if let Some(fragment) = self.url.fragment() {
                out.push('#');
                out.push_str(fragment);
            }
        }
        out
    }

    /// Absolute URI used on requests forwarded through a proxy. Userinfo is
    /// never included.
    pub fn absolute_form(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host_header(), self.origin_form(true))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.absolute_form())
    }
}

/// A plain-HTTP forward proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    host: String,
    port: u16,
    authorization: Option<String>,
}

impl Proxy {
    /// Parse `http://[user:pass@]host[:port]` or a bare `host:port`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{raw}")
        };
        let url = Url::parse(&with_scheme).map_err(|e| format!("invalid proxy URL {raw:?}: {e}"))?;
        if url.scheme() != "http" {
            return Err(format!(
                "unsupported proxy scheme {:?}; only http proxies are supported",
                url.scheme()
            ));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| format!("proxy URL {raw:?} has no host"))?
            .to_string();
        Ok(Self {
            host,
            port: url.port().unwrap_or(80),
            authorization: basic_authorization(&url),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `Proxy-Authorization` value derived from the proxy URL's userinfo.
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

/// `Basic` credentials from a URL's userinfo, percent-decoded first.
pub fn basic_authorization(url: &Url) -> Option<String> {
    if url.username().is_empty() && url.password().is_none() {
        return None;
    }
    let user = percent_decode_str(url.username()).decode_utf8_lossy();
    let pass = url
        .password()
        .map(|p| percent_decode_str(p).decode_utf8_lossy().into_owned())
        .unwrap_or_default();
    Some(format!("Basic {}", STANDARD.encode(format!("{user}:{pass}"))))
}
