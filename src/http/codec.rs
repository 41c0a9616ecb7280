//! HTTP/1.1 wire codec.
//!
//! # Responsibilities
//! - Serialize a request: request line, `Host`, caller headers, framing, body
//! - Parse status lines and header blocks, skipping interim 1xx responses
//! - Parse serialized requests back (used by tests and by mock peers)
//!
//! # Design Decisions
//! - Readers are any `AsyncBufRead`, so the same code runs over sockets,
//!   tunnels, TLS streams and in-memory buffers
//! - Every line read carries its own read deadline
//! - Heads are bounded; a peer cannot make us buffer an unbounded header block
//! - Lines are split on raw bytes. Start lines, header names and chunk sizes
//!   must be ASCII; header values and reason phrases may carry obs-text, and
//!   bytes that are not UTF-8 are read as ISO-8859-1
//! - Errors quote the offending line so they are actionable without a capture

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{Phase, TransportError, TransportResult};
use crate::http::body::{self, Framing};
use crate::http::{Headers, Request, Response, Version};
use crate::resilience::timeouts::io_deadline;

/// Upper bound on one request or response head, start line included.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Upper bound on the trailer block of a chunked body.
pub const MAX_TRAILER_BYTES: usize = 16 * 1024;

/// Status line and headers of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub version: Version,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
}

/// Serialize `request` for the wire.
///
/// `request_target` is the origin-form path or absolute URI chosen by the
/// route; `host` always comes from the target, never from a proxy.
pub fn encode_request(request: &Request, request_target: &str, host: &str) -> TransportResult<Vec<u8>> {
    request.validate()?;
    if request_target.contains(|c: char| c.is_ascii_whitespace() || c.is_ascii_control()) {
        return Err(TransportError::encoding(format!(
            "request target contains whitespace or control characters: {request_target:?}"
        )));
    }
    check_field("Host", host)?;

    let framing = body::request_framing(&request.headers)?;
    let mut out = Vec::with_capacity(256 + request.body.len());
    let request_line = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", request.method, request_target, host);
    out.extend_from_slice(request_line.as_bytes());

    for (name, value) in request.headers.iter() {
        if name.eq_ignore_ascii_case("host") {
            continue;
        }
        check_field(name, value)?;
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }

    match framing {
        Framing::Chunked => {
            out.extend_from_slice(b"\r\n");
            if !request.body.is_empty() {
                out.extend_from_slice(format!("{:X}\r\n", request.body.len()).as_bytes());
                out.extend_from_slice(&request.body);
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(b"0\r\n\r\n");
        }
        Framing::Length(declared) => {
            if declared != request.body.len() {
                return Err(TransportError::encoding(format!(
                    "Content-Length {declared} does not match body length {}",
                    request.body.len()
                )));
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&request.body);
        }
        Framing::Empty | Framing::Close => {
            out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", request.body.len()).as_bytes());
            out.extend_from_slice(&request.body);
        }
    }
    Ok(out)
}

fn check_field(name: &str, value: &str) -> TransportResult<()> {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return Err(TransportError::encoding(format!("invalid header name {name:?}")));
    }
    if value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0) {
        return Err(TransportError::encoding(format!(
            "header {name} contains a line break"
        )));
    }
    Ok(())
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Read one line, without its line terminator.
///
/// Returns `None` on a clean end of stream before any byte was read, and the
/// number of bytes consumed otherwise.
pub(crate) async fn read_line<R>(
    reader: &mut R,
    max: usize,
    read_timeout: Duration,
) -> TransportResult<Option<(Vec<u8>, usize)>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = (&mut *reader).take(max as u64);
    let n = io_deadline(Phase::Read, read_timeout, limited.read_until(b'\n', &mut buf)).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        if n >= max {
            return Err(TransportError::parse(format!("Line exceeds {max} bytes")));
        }
        return Err(TransportError::parse(format!(
            "Connection closed mid-line: {:?}",
            String::from_utf8_lossy(&buf)
        )));
    }
    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some((buf, n)))
}

/// Decode field text: UTF-8 when it is, ISO-8859-1 otherwise.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn ascii_line<'a>(line: &'a [u8], what: &str) -> TransportResult<&'a str> {
    if !line.is_ascii() {
        return Err(TransportError::parse(format!(
            "Malformed {what}: {:?}",
            String::from_utf8_lossy(line)
        )));
    }
    std::str::from_utf8(line).map_err(|_| TransportError::parse(format!("Malformed {what}")))
}

/// Bytes left for one header or trailer block.
pub(crate) struct HeadBudget {
    remaining: usize,
    limit: usize,
    label: &'static str,
}

impl HeadBudget {
    pub(crate) fn head() -> Self {
        Self {
            remaining: MAX_HEAD_BYTES,
            limit: MAX_HEAD_BYTES,
            label: "Head exceeds",
        }
    }

    pub(crate) fn trailers() -> Self {
        Self {
            remaining: MAX_TRAILER_BYTES,
            limit: MAX_TRAILER_BYTES,
            label: "Trailers exceed",
        }
    }

    fn exceeded(&self) -> TransportError {
        TransportError::parse(format!("{} {} bytes", self.label, self.limit))
    }
}

/// Read header lines until the blank line that ends a head.
pub(crate) async fn read_header_block<R>(
    reader: &mut R,
    budget: &mut HeadBudget,
    read_timeout: Duration,
) -> TransportResult<Headers>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = Headers::new();
    loop {
        let line = next_head_line(reader, budget, read_timeout)
            .await?
            .ok_or_else(|| TransportError::parse("Connection closed before end of headers"))?;
        if line.is_empty() {
            return Ok(headers);
        }
        let (name, value) = parse_header_line(&line)?;
        headers.add(name, value);
    }
}

async fn next_head_line<R>(
    reader: &mut R,
    budget: &mut HeadBudget,
    read_timeout: Duration,
) -> TransportResult<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    if budget.remaining == 0 {
        return Err(budget.exceeded());
    }
    let line = read_line(reader, budget.remaining, read_timeout)
        .await
        .map_err(|e| match e {
            TransportError::Parse(msg) if msg.starts_with("Line exceeds") => budget.exceeded(),
            other => other,
        })?;
    Ok(line.map(|(bytes, used)| {
        budget.remaining -= used;
        bytes
    }))
}

fn parse_header_line(line: &[u8]) -> TransportResult<(String, String)> {
    let shown = || String::from_utf8_lossy(line).into_owned();
    if line.starts_with(b" ") || line.starts_with(b"\t") {
        return Err(TransportError::parse(format!("Malformed header line (folded): {:?}", shown())));
    }
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or_else(|| TransportError::parse(format!("Malformed header line: {:?}", shown())))?;
    let (name, value) = (&line[..colon], &line[colon + 1..]);
    if name.is_empty() || !name.iter().copied().all(is_token_byte) {
        return Err(TransportError::parse(format!("Malformed header name in line: {:?}", shown())));
    }
    let name = ascii_line(name, "header name")?;
    Ok((name.to_string(), decode_text(value).trim_matches([' ', '\t']).to_string()))
}

fn parse_version(token: &str, line: &str) -> TransportResult<Version> {
    match token {
        "HTTP/1.1" => Ok(Version::Http11),
        "HTTP/1.0" => Ok(Version::Http10),
        _ => Err(TransportError::parse(format!("Malformed status line: {line:?}"))),
    }
}

fn parse_status_line(raw: &[u8]) -> TransportResult<(Version, u16, String)> {
    let line = decode_text(raw);
    let line = line.as_str();
    let malformed = || TransportError::parse(format!("Malformed status line: {line:?}"));
    let (version, rest) = line.split_once(' ').ok_or_else(malformed)?;
    let version = parse_version(version, line)?;
    let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let status: u16 = code.parse().map_err(|_| malformed())?;
    if !(100..=599).contains(&status) {
        return Err(malformed());
    }
    Ok((version, status, reason.trim().to_string()))
}

/// Read a final response head, skipping interim `1xx` responses.
pub async fn read_response_head<R>(reader: &mut R, read_timeout: Duration) -> TransportResult<ResponseHead>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut budget = HeadBudget::head();
        let line = next_head_line(reader, &mut budget, read_timeout)
            .await?
            .ok_or_else(|| TransportError::parse("Connection closed before status line"))?;
        let (version, status, reason) = parse_status_line(&line)?;
        let headers = read_header_block(reader, &mut budget, read_timeout).await?;

        if (100..200).contains(&status) && status != 101 {
            tracing::trace!(status, "Skipping interim response");
            continue;
        }
        return Ok(ResponseHead {
            version,
            status,
            reason,
            headers,
        });
    }
}

/// Read a complete response to a request made with `method`.
pub async fn read_response<R>(reader: &mut R, method: &str, read_timeout: Duration) -> TransportResult<Response>
where
    R: AsyncBufRead + Unpin,
{
    let head = read_response_head(reader, read_timeout).await?;
    let framing = body::response_framing(method, head.status, &head.headers)?;
    let (body, trailers) = body::read_body(reader, framing, read_timeout).await?;
    Ok(Response {
        status: head.status,
        reason: head.reason,
        version: head.version,
        headers: head.headers,
        body,
        trailers,
    })
}

/// Parse a serialized request. The returned target is the raw request-target.
pub async fn read_request<R>(reader: &mut R, read_timeout: Duration) -> TransportResult<Request>
where
    R: AsyncBufRead + Unpin,
{
    let mut budget = HeadBudget::head();
    let line = next_head_line(reader, &mut budget, read_timeout)
        .await?
        .ok_or_else(|| TransportError::parse("Connection closed before request line"))?;
    let line = ascii_line(&line, "request line")?;
    let malformed = || TransportError::parse(format!("Malformed request line: {line:?}"));
    let mut parts = line.split(' ');
    let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v), None) if !m.is_empty() && !t.is_empty() => (m, t, v),
        _ => return Err(malformed()),
    };
    if version != "HTTP/1.1" && version != "HTTP/1.0" {
        return Err(malformed());
    }
    let headers = read_header_block(reader, &mut budget, read_timeout).await?;
    let framing = body::request_framing(&headers)?;
    let (body, _) = body::read_body(reader, framing, read_timeout).await?;
    Ok(Request {
        method: method.to_string(),
        target: target.to_string(),
        headers,
        body,
    })
}
