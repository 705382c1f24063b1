//! Request logging middleware

use std::time::Instant;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

/// One structured line per request with method, path, status and latency
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        warn!(method = %method, path = %path, status = status, latency_ms = latency_ms, "Request failed");
    } else {
        info!(method = %method, path = %path, status = status, latency_ms = latency_ms, "Request handled");
    }

    response
}
