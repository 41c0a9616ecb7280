//! Metrics collection.
//!
//! # Responsibilities
//! - Define transport metrics (requests, latency, redirects, errors, connections)
//! - Record through the `metrics` facade; exposition belongs to the host process
//!
//! # Metrics
//! - `transport_requests_total` (counter): completed exchanges by method, status
//! - `transport_request_duration_seconds` (histogram): latency per exchange
//! - `transport_redirects_total` (counter): redirects followed
//! - `transport_errors_total` (counter): failed sends by error kind
//! - `transport_open_connections` (gauge): connections currently open
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels limited to method, status code and error kind

use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "transport_requests_total";
pub const REQUEST_DURATION: &str = "transport_request_duration_seconds";
pub const REDIRECTS_TOTAL: &str = "transport_redirects_total";
pub const ERRORS_TOTAL: &str = "transport_errors_total";
pub const OPEN_CONNECTIONS: &str = "transport_open_connections";

/// Record one completed request/response exchange.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!(REQUESTS_TOTAL, "method" => method.clone(), "status" => status.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION, "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_redirect(status: u16) {
    metrics::counter!(REDIRECTS_TOTAL, "status" => status.to_string()).increment(1);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
}

pub fn connection_opened() {
    metrics::gauge!(OPEN_CONNECTIONS).increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!(OPEN_CONNECTIONS).decrement(1.0);
}
