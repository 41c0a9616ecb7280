//! Route selection: how a target is reached.
//!
//! ```text
//! proxy?  scheme   route     socket peer   request line
//! no      http     Direct    target        /path?query
//! no      https    Direct    target        /path?query        (TLS to target)
//! yes     http     Forward   proxy         http://host/path?query#frag
//! yes     https    Tunnel    proxy         /path?query#frag   (CONNECT, TLS to target)
//! ```

use crate::routing::target::{Proxy, Target};

/// Path from this client to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Straight to the target.
    Direct,
    /// Plain request handed to the proxy with an absolute-URI request line.
    Forward(&'a Proxy),
    /// CONNECT tunnel through the proxy, then TLS to the target.
    Tunnel(&'a Proxy),
}

impl<'a> Route<'a> {
    pub fn select(target: &Target, proxy: Option<&'a Proxy>) -> Self {
        match proxy {
            None => Route::Direct,
            Some(proxy) if target.scheme().is_secure() => Route::Tunnel(proxy),
            Some(proxy) => Route::Forward(proxy),
        }
    }

    /// Request-target written on the request line for `target`.
    ///
    /// Proxied routes keep the fragment so the proxy sees the resource exactly
    /// as it was requested, including after a redirect.
    pub fn request_target(&self, target: &Target) -> String {
        match self {
            Route::Direct => target.origin_form(false),
            Route::Tunnel(_) => target.origin_form(true),
            Route::Forward(_) => target.absolute_form(),
        }
    }

    /// `Proxy-Authorization` to attach to the request itself. Only forwarded
    /// requests carry it; tunnels send it on the CONNECT instead.
    pub fn proxy_authorization(&self) -> Option<&'a str> {
        match self {
            Route::Forward(proxy) => proxy.authorization(),
            _ => None,
        }
    }

    pub fn proxy(&self) -> Option<&'a Proxy> {
        match self {
            Route::Direct => None,
            Route::Forward(proxy) | Route::Tunnel(proxy) => Some(proxy),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Direct => "direct",
            Route::Forward(_) => "forward",
            Route::Tunnel(_) => "tunnel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn target(url: &str) -> Target {
        Target::from_url(Url::parse(url).unwrap()).unwrap()
    }

    #[test]
    fn no_proxy_is_direct() {
        let t = target("https://example.com/a?b#c");
        let route = Route::select(&t, None);
        assert_eq!(route, Route::Direct);
        assert_eq!(route.request_target(&t), "/a?b");
    }

    #[test]
    fn plain_scheme_through_proxy_forwards_absolute_uri() {
        let proxy = Proxy::parse("127.0.0.1:3128").unwrap();
        let t = target("http://another.server.com/proxy?foo#bar");
        let route = Route::select(&t, Some(&proxy));
        assert!(matches!(route, Route::Forward(_)));
        assert_eq!(route.request_target(&t), "http://another.server.com/proxy?foo#bar");
    }

    #[test]
    fn secure_scheme_through_proxy_tunnels() {
        let proxy = Proxy::parse("http://u:p@127.0.0.1:3128").unwrap();
        let t = target("https://another.server.com/proxy");
        let route = Route::select(&t, Some(&proxy));
        assert!(matches!(route, Route::Tunnel(_)));
        assert_eq!(route.request_target(&t), "/proxy");
        assert!(route.proxy_authorization().is_none());
        assert_eq!(route.proxy().map(|p| p.authority()), Some("127.0.0.1:3128".to_string()));
    }
}
