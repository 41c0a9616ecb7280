//! Redirect resolution.
//!
//! ```text
//! status      original method     next method   body
//! 303         any                 GET           dropped
//! 301, 302    GET / HEAD          unchanged     unchanged
//! 301, 302    anything else       GET           dropped
//! 307, 308    any                 unchanged     unchanged
//! ```
//!
//! `Host` and `Content-Length` are removed from the carried headers and
//! recomputed for the new target. When the previous hop went through a proxy
//! the original query and fragment are re-attached to a `Location` that has
//! none, so the proxy sees the resource as it was requested.

use url::Url;

use crate::error::{TransportError, TransportResult};
use crate::http::{Headers, Request};

/// Statuses the client follows.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

pub fn is_redirect(status: u16) -> bool {
    REDIRECT_STATUSES.contains(&status)
}

/// Method for the follow-up request, and whether the body survives.
pub fn redirect_method(status: u16, method: &str) -> (String, bool) {
    let safe = method == "GET" || method == "HEAD";
    match status {
        303 => ("GET".to_string(), false),
        301 | 302 if !safe => ("GET".to_string(), false),
        _ => (method.to_string(), true),
    }
}

fn location_error(detail: impl std::fmt::Display) -> TransportError {
    TransportError::parse(format!(
        "Failed to parse \"Location\" header for server redirect: {detail}"
    ))
}

/// Resolve a `Location` value against the URL of the request that produced it.
pub fn resolve_location(location: Option<&str>, base: &Url) -> TransportResult<Url> {
    let raw = location
        .map(str::trim)
        .ok_or_else(|| location_error("header missing"))?;
    if raw.is_empty() {
        return Err(location_error("empty value"));
    }
    let url = base
        .join(raw)
        .map_err(|e| location_error(format!("{raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(location_error(format!("{raw:?}: unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(location_error(format!("{raw:?}: missing host")));
    }
    Ok(url)
}

/// Build the follow-up request for a redirect response.
///
/// `current` is the absolute URL of the request that was redirected.
/// Returns the next request together with its absolute URL.
pub fn next_request(
    status: u16,
    response_headers: &Headers,
    request: &Request,
    current: &Url,
    proxied: bool,
) -> TransportResult<(Request, Url)> {
    let mut next_url = resolve_location(response_headers.get("Location"), current)?;

    if next_url.fragment().is_none() {
        next_url.set_fragment(current.fragment());
    }
    if proxied && next_url.query().is_none() {
        next_url.set_query(current.query());
    }

    let (method, keep_body) = redirect_method(status, &request.method);

    let mut headers = request.headers.clone();
    headers.remove("Host");
    headers.remove("Content-Length");
    if !keep_body {
        headers.remove("Content-Type");
        headers.remove("Transfer-Encoding");
    }

    let next = Request {
        method,
        target: next_url.to_string(),
        headers,
        body: if keep_body { request.body.clone() } else { Vec::new() },
    };
    Ok((next, next_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn location(value: &str) -> Headers {
        [("Location", value)].into_iter().collect()
    }

    #[test]
    fn redirect_statuses() {
        for status in [301, 302, 303, 307, 308] {
            assert!(is_redirect(status));
        }
        for status in [200, 300, 304, 305, 306, 401] {
            assert!(!is_redirect(status));
        }
    }

    #[test]
    fn see_other_turns_post_into_bodiless_get() {
        let body = vec![b'x'; 4096];
        let request = Request::post("http://h/a", body)
            .with_header("Content-Type", "application/json")
            .with_header("Content-Length", "4096")
            .with_header("X-Trace", "1");
        let (next, next_url) =
            next_request(303, &location("/b"), &request, &url("http://h/a"), false).unwrap();
        assert_eq!(next.method, "GET");
        assert!(next.body.is_empty());
        assert!(!next.headers.contains("Content-Length"));
        assert!(!next.headers.contains("Content-Type"));
        assert_eq!(next.headers.get("X-Trace"), Some("1"));
        assert_eq!(next_url.as_str(), "http://h/b");
    }

    #[test]
    fn temporary_redirect_preserves_method_and_body() {
        let request = Request::post("http://h/a", b"{\"k\":1}".to_vec())
            .with_header("Content-Type", "application/json");
        for status in [307, 308] {
            let (next, _) =
                next_request(status, &location("/b"), &request, &url("http://h/a"), false).unwrap();
            assert_eq!(next.method, "POST");
            assert_eq!(next.body, b"{\"k\":1}");
            assert_eq!(next.headers.get("content-type"), Some("application/json"));
        }
    }

    #[test]
    fn moved_keeps_get_and_rewrites_other_methods() {
        assert_eq!(redirect_method(301, "GET"), ("GET".to_string(), true));
        assert_eq!(redirect_method(302, "HEAD"), ("HEAD".to_string(), true));
        assert_eq!(redirect_method(301, "POST"), ("GET".to_string(), false));
        assert_eq!(redirect_method(302, "DELETE"), ("GET".to_string(), false));
        assert_eq!(redirect_method(303, "HEAD"), ("GET".to_string(), false));
    }

    #[test]
    fn host_is_dropped_for_the_next_target() {
        let request = Request::get("http://h/a").with_header("Host", "h");
        let (next, _) = next_request(
            302,
            &location("http://other:8080/x"),
            &request,
            &url("http://h/a"),
            false,
        )
        .unwrap();
        assert!(!next.headers.contains("host"));
        assert_eq!(next.target, "http://other:8080/x");
    }

    #[test]
    fn path_only_location_uses_original_authority() {
        let resolved = resolve_location(Some("/hello"), &url("http://localhost:4444/wd/hub/session")).unwrap();
        assert_eq!(resolved.as_str(), "http://localhost:4444/hello");
    }

    #[test]
    fn bad_locations_are_parse_errors() {
        let base = url("http://localhost:4444/a");
        for value in [None, Some(""), Some("   "), Some("ftp://files/x"), Some("http://")] {
            let err = resolve_location(value, &base).unwrap_err();
            assert!(matches!(err, TransportError::Parse(_)), "{value:?} gave {err:?}");
            assert!(
                err.to_string().contains("Failed to parse \"Location\""),
                "{value:?} gave {err}"
            );
        }
    }

    #[test]
    fn proxied_redirect_keeps_query_and_fragment() {
        let current = url("http://another.server.com/proxy/redirect?foo#bar");
        let request = Request::get(current.as_str());
        let (_, next_url) = next_request(303, &location("/proxy"), &request, &current, true).unwrap();
        assert_eq!(next_url.as_str(), "http://another.server.com/proxy?foo#bar");
    }

    #[test]
    fn direct_redirect_takes_query_from_location() {
        let current = url("http://h/a?foo#bar");
        let request = Request::get(current.as_str());
        let (_, next_url) = next_request(302, &location("/b"), &request, &current, false).unwrap();
        assert_eq!(next_url.as_str(), "http://h/b#bar");
    }

    #[test]
    fn location_fragment_wins() {
        let current = url("http://h/a#old");
        let request = Request::get(current.as_str());
        let (_, next_url) = next_request(301, &location("/b#new"), &request, &current, true).unwrap();
        assert_eq!(next_url.as_str(), "http://h/b#new");
    }
}
