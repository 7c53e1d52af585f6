//! Axum middleware applied to the router.
//!
//! Request tracing, timeout enforcement and compression come from `tower-http`
//! (see [`super::router`]); this module adds a per-request id.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Response header carrying the id assigned to each request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assign a fresh request id, run the rest of the stack inside a span tagged
/// with it, and echo it back in [`REQUEST_ID_HEADER`].
pub async fn request_id(req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    let span = info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let mut resp = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}
