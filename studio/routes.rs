use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::state::SharedState;
use crate::handlers;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn respond_with(status: u16, content_type: &'static [u8], body: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = body.len();
    let headers = Header::from_bytes(&b"Content-Type"[..], content_type)
        .map(|h| vec![h])
        .unwrap_or_default();
    Response::new(StatusCode(status), headers, Cursor::new(body), Some(len), None)
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    respond_with(200, b"text/html; charset=utf-8", body.into_bytes())
}

pub fn text_response(body: &str) -> Response<Cursor<Vec<u8>>> {
    respond_with(200, b"text/plain; charset=utf-8", body.as_bytes().to_vec())
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    respond_with(404, b"text/plain", b"404 Not Found".to_vec())
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
///
/// Handlers receive a `&mut Request` so the dispatcher keeps ownership and
/// calls `request.respond(response)` at the end.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url    = request.url().to_owned();
    let path   = url.split('?').next().unwrap_or("").to_owned();

    let response = match (method, path.as_str()) {
        (Method::Get,  "/")         => handlers::classify::handle_get(state),
        (Method::Post, "/classify") => handlers::classify::handle_post(&mut request, state),
        (Method::Get,  "/health")   => text_response("ok"),
        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        tracing::debug!(url = %url, "client went away before the response was sent: {e}");
    }
}
