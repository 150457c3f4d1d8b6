//! Response body type and header policy shared by every route

use crate::error::ProxyError;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use futures::TryStreamExt;
use http::{Response, StatusCode};
use hyper::body::Frame;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};

/// Body type of every response the proxy produces
pub type ProxyBody = UnsyncBoxBody<Bytes, ProxyError>;

pub const ALLOWED_METHODS: &str = "GET, HEAD, POST, PUT, OPTIONS";

/// Headers that must never block framing or scripting of the proxied page
pub const CSP_HEADERS: [&str; 2] = ["content-security-policy", "x-content-security-policy"];

/// Connection-scoped headers that are never forwarded in either direction
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
];

pub fn full(body: impl Into<Bytes>) -> ProxyBody {
    Full::new(body.into()).map_err(|never| match never {}).boxed_unsync()
}

pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed_unsync()
}

/// Stream an upstream body through unchanged
pub fn upstream_body(response: reqwest::Response) -> ProxyBody {
    let frames = response
        .bytes_stream()
        .map_ok(Frame::data)
        .map_err(ProxyError::from);
    StreamBody::new(frames).boxed_unsync()
}

/// Remove `Content-Security-Policy` and `X-Content-Security-Policy`
pub fn strip_csp(headers: &mut HeaderMap) {
    for name in CSP_HEADERS {
        headers.remove(name);
    }
}

/// Remove connection-scoped headers, plus `upgrade`
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

/// Header policy for a response whose body is replaced or rewritten
pub fn prepare_rewritten_headers(headers: &mut HeaderMap) {
    strip_hop_by_hop(headers);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::CONTENT_ENCODING);
}

/// Build a response from a status, a header map and a body
pub fn with_parts(status: StatusCode, headers: HeaderMap, body: ProxyBody) -> Response<ProxyBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn simple(
    status: StatusCode,
    headers: &[(HeaderName, &str)],
    body: ProxyBody,
) -> Response<ProxyBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    for (name, value) in headers {
        if let Ok(value) = HeaderValue::from_str(value) {
            response.headers_mut().insert(name.clone(), value);
        }
    }
    response
}

/// Empty 200 with the fixed CORS allow-list
pub fn preflight_response() -> Response<ProxyBody> {
    simple(
        StatusCode::OK,
        &[
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        empty(),
    )
}

/// Empty 200 advertising the allowed methods
pub fn options_response() -> Response<ProxyBody> {
    simple(StatusCode::OK, &[(header::ALLOW, ALLOWED_METHODS)], empty())
}

pub fn redirect_response(status: StatusCode, location: &str) -> Response<ProxyBody> {
    simple(status, &[(header::LOCATION, location)], empty())
}

pub fn text_response(content_type: &str, body: String) -> Response<ProxyBody> {
    simple(StatusCode::OK, &[(header::CONTENT_TYPE, content_type)], full(body))
}

/// Plain-text response describing a proxy failure
pub fn error_response(err: &ProxyError) -> Response<ProxyBody> {
    let status = StatusCode::from_u16(err.to_http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    simple(
        status,
        &[(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        full(format!("{}\n", err)),
    )
}

/// Whether the response headers announce an HTML document
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false)
}
