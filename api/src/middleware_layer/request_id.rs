use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use services::uuid::random_id;
use tracing::{Instrument, info_span};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Request id attached by [`request_id`], or `-` outside the middleware.
pub fn request_id_of(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}

/// Echoes a non-empty incoming `X-Request-Id` or generates one, exposes it to
/// handlers through the request headers, and sets it on the response.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let incoming = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| HeaderValue::from_str(v).ok());

    let value = match incoming {
        Some(v) => v,
        None => HeaderValue::from_str(&random_id("req")).unwrap_or(HeaderValue::from_static("req-unknown")),
    };
    req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());

    let span = info_span!(
        "http",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = value.to_str().unwrap_or("-")
    );
    let mut res = next.run(req).instrument(span).await;
    res.headers_mut().insert(REQUEST_ID_HEADER, value);
    res
}
