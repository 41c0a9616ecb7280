//! Shared mock servers for integration tests.
//!
//! Every server binds an ephemeral port, serves one request per connection
//! and closes the socket, mirroring `Connection: close`.
#![allow(dead_code)]

use std::fs::File;
use std::io::BufReader as StdBufReader;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use url::Url;

use remote_transport::http::read_request;
use remote_transport::{HttpClient, Request, TransportConfig};

pub const TLS_HOST: &str = "another.server.com";
const SERVER_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests seen by a mock server, in arrival order.
pub type Recorded = Arc<Mutex<Vec<Request>>>;

pub fn recorded(log: &Recorded) -> Vec<Request> {
    log.lock().unwrap().clone()
}

pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// Client with short deadlines so failing tests fail fast.
pub fn client(config: TransportConfig) -> HttpClient {
    HttpClient::new(fast(config)).unwrap()
}

pub fn fast(mut config: TransportConfig) -> TransportConfig {
    config.timeouts.connect_ms = 2_000;
    config.timeouts.handshake_ms = 2_000;
    config.timeouts.read_ms = 2_000;
    config
}

/// Serialize a `Content-Length` framed response.
pub fn response(status: u16, reason: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {status} {reason}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));
    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// Start a server answering every request with `handler(request, own_addr)`.
///
/// CONNECT requests are handled as a proxy: `another.server.com:443` gets a
/// `200` and a TLS origin inside the tunnel; anything else gets `403`. The
/// origin answers `*/proxy/redirect` with a `303` to `/proxy` and everything
/// else with a close-delimited greeting.
pub async fn start_server<F>(handler: F) -> (SocketAddr, Recorded)
where
    F: Fn(&Request, SocketAddr) -> Vec<u8> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Recorded = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let task_log = Arc::clone(&log);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = Arc::clone(&handler);
                    let log = Arc::clone(&task_log);
                    tokio::spawn(async move {
                        let _ = serve(socket, addr, handler, log).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, log)
}

async fn serve<F>(
    socket: TcpStream,
    addr: SocketAddr,
    handler: Arc<F>,
    log: Recorded,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Fn(&Request, SocketAddr) -> Vec<u8> + Send + Sync + 'static,
{
    let mut io = BufReader::new(socket);
    let request = read_request(&mut io, SERVER_READ_TIMEOUT).await?;
    log.lock().unwrap().push(request.clone());

    if request.method == "CONNECT" {
        let mut socket = io.into_inner();
        if request.target != format!("{TLS_HOST}:443") {
            socket.write_all(b"HTTP/1.1 403 Forbidden\r\n\r\n").await?;
            socket.shutdown().await?;
            return Ok(());
        }
        socket
            .write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n")
            .await?;

        let tls = tls_acceptor().accept(socket).await?;
        let mut tls = BufReader::new(tls);
        let inner = read_request(&mut tls, SERVER_READ_TIMEOUT).await?;
        let (path, _, _) = split_target(&inner.target);
        log.lock().unwrap().push(inner);
        if path.ends_with("/proxy/redirect") {
            tls.write_all(&response(303, "See Other", &[("Location", "/proxy")], b""))
                .await?;
        } else {
            tls.write_all(b"HTTP/1.1 200 OK\r\nHost: another.server.com\r\n\r\nHello from TLS server.")
                .await?;
        }
        tls.shutdown().await?;
        return Ok(());
    }

    let reply = handler(&request, addr);
    io.write_all(&reply).await?;
    io.shutdown().await?;
    Ok(())
}

fn tls_acceptor() -> TlsAcceptor {
    let certs = rustls_pemfile::certs(&mut StdBufReader::new(
        File::open(fixture("server-cert.pem")).unwrap(),
    ))
    .collect::<Result<Vec<_>, _>>()
    .unwrap();
    let key = rustls_pemfile::private_key(&mut StdBufReader::new(
        File::open(fixture("server-key.pem")).unwrap(),
    ))
    .unwrap()
    .unwrap();

    let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .unwrap();
    TlsAcceptor::from(Arc::new(config))
}

/// A server that accepts connections and never answers.
pub async fn start_stalled_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// The remote end used by most tests. Also acts as a forward proxy: an
/// absolute-URI request is routed by its path.
pub async fn start_remote_end() -> (SocketAddr, Recorded) {
    start_server(remote_end).await
}

fn split_target(target: &str) -> (String, Option<String>, Option<String>) {
    let url = Url::parse(target)
        .or_else(|_| Url::parse("http://origin.invalid").and_then(|base| base.join(target)))
        .unwrap();
    (
        url.path().to_string(),
        url.query().map(str::to_string),
        url.fragment().map(str::to_string),
    )
}

fn remote_end(req: &Request, addr: SocketAddr) -> Vec<u8> {
    let (path, query, fragment) = split_target(&req.target);
    let suffix = format!(
        "{}{}",
        query.map(|q| format!("?{q}")).unwrap_or_default(),
        fragment.map(|f| format!("#{f}")).unwrap_or_default()
    );

    match (req.method.as_str(), path.as_str()) {
        ("GET", "/echo") => {
            let headers: serde_json::Map<String, serde_json::Value> = req
                .headers
                .iter()
                .map(|(n, v)| (n.to_ascii_lowercase(), serde_json::Value::from(v)))
                .collect();
            let body = serde_json::to_vec(&headers).unwrap();
            response(200, "OK", &[("Content-Type", "application/json")], &body)
        }
        ("GET", "/redirect") => {
            let location = format!("http://{addr}/hello");
            response(303, "See Other", &[("Location", location.as_str())], b"")
        }
        ("GET", "/hello") => response(200, "OK", &[("Content-Type", "text/plain")], b"hello, world!"),
        ("GET", "/chunked") => b"HTTP/1.1 200 OK\r\n\
            Content-Type: text/html; charset=utf-8\r\n\
            Transfer-Encoding: chunked\r\n\r\n\
            f\r\n<!DOCTYPE html>\r\n\
            16\r\n<h1>Hello, world!</h1>\r\n\
            0\r\n\r\n"
            .to_vec(),
        ("GET", "/badredirect") => response(303, "See Other", &[], b""),
        ("GET", "/protected") => {
            let granted = req
                .headers
                .get("Authorization")
                .and_then(|v| v.strip_prefix("Basic "))
                .and_then(|b64| STANDARD.decode(b64).ok())
                .map_or(false, |raw| raw == b"genie:bottle");
            if granted {
                response(200, "OK", &[("Content-Type", "text/plain")], b"Access granted!")
            } else {
                response(
                    401,
                    "Unauthorized",
                    &[("WWW-Authenticate", "Basic realm=\"test\"")],
                    b"Access denied",
                )
            }
        }
        ("GET", p) if p.ends_with("/proxy/redirect") => {
            let location = format!("/proxy{suffix}");
            response(303, "See Other", &[("Location", location.as_str())], b"")
        }
        ("GET", p) if p.ends_with("/proxy/bare-redirect") => {
            response(303, "See Other", &[("Location", "/proxy")], b"")
        }
        ("GET", p) if p.ends_with("/proxy") => {
            let mut headers: Vec<(String, String)> = req
                .headers
                .iter()
                .filter(|(n, _)| {
                    !n.eq_ignore_ascii_case("content-length") && !n.eq_ignore_ascii_case("connection")
                })
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect();
            headers.push(("X-Proxy-Request-Uri".to_string(), req.target.clone()));
            let headers: Vec<(&str, &str)> = headers.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();
            response(200, "OK", &headers, b"")
        }
        ("POST", "/submit-303") => response(303, "See Other", &[("Location", "/inspect")], b""),
        ("POST", "/submit-307") => response(307, "Temporary Redirect", &[("Location", "/inspect")], b""),
        (_, "/inspect") => response(200, "OK", &[("X-Method", req.method.as_str())], &req.body),
        (_, "/loop") => response(302, "Found", &[("Location", "/loop")], b""),
        _ => response(404, "Not Found", &[], b""),
    }
}
