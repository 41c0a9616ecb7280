//! Message body framing and decoding.
//!
//! # Framing Rules (responses)
//! ```text
//! HEAD request, 1xx, 204, 304      → no body
//! Content-Length: N (numeric)      → exactly N bytes
//! Transfer-Encoding: ..., chunked  → chunk stream, optional trailers
//! neither                          → read until the peer closes
//! ```
//!
//! Each socket read gets a fresh read deadline, so a body that keeps trickling
//! in is fine and a stalled peer is a timeout.
//!
//! A close-delimited body ends at the first EOF, including the
//! `UnexpectedEof` rustls reports when a peer drops TCP without sending
//! `close_notify`. Such a body cannot be told apart from a truncated one;
//! length and chunked framing still treat that error as fatal.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncReadExt};

use crate::error::{Phase, TransportError, TransportResult};
use crate::http::codec::{decode_text, read_header_block, read_line, HeadBudget};
use crate::http::Headers;
use crate::resilience::timeouts::io_deadline;

const SEGMENT: usize = 16 * 1024;
const MAX_CHUNK_LINE: usize = 4096;

/// How a body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Empty,
    Length(usize),
    Chunked,
    /// Delimited by connection close.
    Close,
}

/// Parse `Content-Length`; repeated headers must agree.
fn content_length(headers: &Headers) -> TransportResult<Option<usize>> {
    let mut found: Option<usize> = None;
    for raw in headers.get_all("content-length") {
        let value = raw.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TransportError::parse(format!("Invalid Content-Length header: {raw:?}")));
        }
        let parsed: usize = value
            .parse()
            .map_err(|_| TransportError::parse(format!("Invalid Content-Length header: {raw:?}")))?;
        match found {
            Some(prev) if prev != parsed => {
                return Err(TransportError::parse(format!(
                    "Conflicting Content-Length headers: {prev} and {parsed}"
                )));
            }
            _ => found = Some(parsed),
        }
    }
    Ok(found)
}

fn is_chunked(headers: &Headers) -> bool {
    headers
        .get_all("transfer-encoding")
        .flat_map(|v| v.split(','))
        .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Framing of a response to a `method` request with `status`.
pub fn response_framing(method: &str, status: u16, headers: &Headers) -> TransportResult<Framing> {
    if method.eq_ignore_ascii_case("HEAD") || (100..200).contains(&status) || status == 204 || status == 304 {
        return Ok(Framing::Empty);
    }
    if let Some(len) = content_length(headers)? {
        return Ok(Framing::Length(len));
    }
    if is_chunked(headers) {
        return Ok(Framing::Chunked);
    }
    Ok(Framing::Close)
}

/// Framing declared by request headers.
///
/// Outgoing requests must not mix framing headers and may only use the
/// `chunked` coding; violations are encoding errors.
pub fn request_framing(headers: &Headers) -> TransportResult<Framing> {
    let te = headers.get("transfer-encoding");
    let cl = headers.get("content-length");
    match (te, cl) {
        (Some(_), Some(_)) => Err(TransportError::encoding(
            "both Content-Length and Transfer-Encoding are set",
        )),
        (Some(te), None) => {
            if te.trim().eq_ignore_ascii_case("chunked") {
                Ok(Framing::Chunked)
            } else {
                Err(TransportError::encoding(format!("unsupported Transfer-Encoding {te:?}")))
            }
        }
        (None, Some(raw)) => {
            let len = content_length(headers)
                .map_err(|_| TransportError::encoding(format!("invalid Content-Length {raw:?}")))?
                .unwrap_or(0);
            Ok(Framing::Length(len))
        }
        (None, None) => Ok(Framing::Empty),
    }
}

/// Read a body with the given framing. Returns the body and chunk trailers.
pub async fn read_body<R>(
    reader: &mut R,
    framing: Framing,
    read_timeout: Duration,
) -> TransportResult<(Vec<u8>, Headers)>
where
    R: AsyncBufRead + Unpin,
{
    match framing {
        Framing::Empty => Ok((Vec::new(), Headers::new())),
        Framing::Length(len) => {
            let mut body = Vec::with_capacity(len.min(SEGMENT * 4));
            read_exact_segments(reader, len, &mut body, read_timeout).await?;
            Ok((body, Headers::new()))
        }
        Framing::Chunked => read_chunked(reader, read_timeout).await,
        Framing::Close => {
            let mut body = Vec::new();
            let mut segment = vec![0u8; SEGMENT];
            loop {
                let n = match io_deadline(Phase::Read, read_timeout, reader.read(&mut segment)).await {
                    Ok(n) => n,
                    Err(TransportError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                        tracing::debug!(received = body.len(), "Peer closed without close_notify");
                        0
                    }
                    Err(e) => return Err(e),
                };
                if n == 0 {
                    break;
                }
                body.extend_from_slice(&segment[..n]);
            }
            Ok((body, Headers::new()))
        }
    }
}

async fn read_exact_segments<R>(
    reader: &mut R,
    len: usize,
    out: &mut Vec<u8>,
    read_timeout: Duration,
) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut remaining = len;
    let mut segment = vec![0u8; SEGMENT.min(len.max(1))];
    while remaining > 0 {
        let want = remaining.min(segment.len());
        let n = io_deadline(Phase::Read, read_timeout, reader.read(&mut segment[..want])).await?;
        if n == 0 {
            return Err(TransportError::parse(format!(
                "Connection closed after {} of {len} body bytes",
                len - remaining
            )));
        }
        out.extend_from_slice(&segment[..n]);
        remaining -= n;
    }
    Ok(())
}

fn parse_chunk_size(line: &[u8]) -> TransportResult<usize> {
    let invalid = || TransportError::parse(format!("Invalid chunk size line: {:?}", decode_text(line)));
    let size = line.split(|&b| b == b';').next().unwrap_or_default();
    let size = std::str::from_utf8(size).map_err(|_| invalid())?.trim();
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    usize::from_str_radix(size, 16).map_err(|_| invalid())
}

async fn read_chunked<R>(reader: &mut R, read_timeout: Duration) -> TransportResult<(Vec<u8>, Headers)>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::new();
    loop {
        let (line, _) = read_line(reader, MAX_CHUNK_LINE, read_timeout)
            .await?
            .ok_or_else(|| TransportError::parse("Connection closed before final chunk"))?;
        let size = parse_chunk_size(&line)?;
        if size == 0 {
            break;
        }
        read_exact_segments(reader, size, &mut body, read_timeout).await?;
        match read_line(reader, MAX_CHUNK_LINE, read_timeout).await? {
            Some((crlf, _)) if crlf.is_empty() => {}
            Some((other, _)) => {
                return Err(TransportError::parse(format!(
                    "Missing CRLF after chunk data, found {:?}",
                    decode_text(&other)
                )));
            }
            None => return Err(TransportError::parse("Connection closed inside chunk")),
        }
    }

    // A peer that closes right after the last chunk has no trailers to send.
    let mut budget = HeadBudget::trailers();
    let trailers = match read_header_block(reader, &mut budget, read_timeout).await {
        Ok(trailers) => trailers,
        Err(TransportError::Parse(msg)) if msg.starts_with("Connection closed before end of headers") => {
            Headers::new()
        }
        Err(e) => return Err(e),
    };
    Ok((body, trailers))
}
