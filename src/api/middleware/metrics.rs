use super::request_id::REQUEST_ID_HEADER;
use axum::{
    extract::{MatchedPath, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Emits one `metrics` event per request, keyed by the matched route rather than the raw URI
/// so upload paths with query strings aggregate together.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let request_id = header_str(&req, REQUEST_ID_HEADER);
    let request_bytes = header_str(&req, header::CONTENT_LENGTH.as_str());

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        tracing::warn!(
            target: "metrics",
            method = %method,
            route = %route,
            status,
            latency_ms,
            request_bytes = %request_bytes,
            request_id = %request_id,
            "media_request_failed"
        );
    } else {
        tracing::info!(
            target: "metrics",
            method = %method,
            route = %route,
            status,
            latency_ms,
            request_bytes = %request_bytes,
            request_id = %request_id,
            "media_request_completed"
        );
    }

    response
}

fn header_str(req: &Request, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}
