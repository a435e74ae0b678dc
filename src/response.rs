//! Outgoing responses and the [`Render`] contract.
//!
//! Whatever a wrapped action returns must know how to write itself into a
//! [`ResponseWriter`]. Three shapes ship with the crate:
//!
//! | Type | Body | Content type |
//! |---|---|---|
//! | [`Basic`] | text as given | `text/plain; charset=utf-8` |
//! | [`Error`] | the message | `text/plain; charset=utf-8` |
//! | [`Json`] | pretty-printed payload | `application/json; charset=utf-8` |
//!
//! Implement [`Render`] on your own types to return them directly.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde::Serialize;

const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// A finished HTTP response.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Basic::new(body).into_response()
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseWriter ───────────────────────────────────────────────────────────

/// The output channel a [`Render`] implementation writes into.
///
/// The first status written wins. Writing body bytes before any status
/// commits `200 OK`.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self { Self::default() }

    pub fn write_status(&mut self, code: StatusCode) {
        if self.status.is_none() {
            self.status = Some(code);
        }
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    pub fn write(&mut self, bytes: &[u8]) {
        self.write_status(StatusCode::OK);
        self.body.extend_from_slice(bytes);
    }

    pub fn finish(self) -> Response {
        Response {
            status: self.status.unwrap_or(StatusCode::OK),
            headers: self.headers,
            body: Bytes::from(self.body),
        }
    }
}

// ── Render ───────────────────────────────────────────────────────────────────

/// Applies a value to an output channel.
pub trait Render {
    fn render_to(self, w: &mut ResponseWriter);

    fn into_response(self) -> Response
    where
        Self: Sized,
    {
        let mut w = ResponseWriter::new();
        self.render_to(&mut w);
        w.finish()
    }
}

/// Lets wrapping code change the status of a response before it renders.
pub trait StatusOverride {
    fn set_status(&mut self, code: StatusCode);

    fn with_status(mut self, code: StatusCode) -> Self
    where
        Self: Sized,
    {
        self.set_status(code);
        self
    }
}

impl Render for Response {
    fn render_to(self, w: &mut ResponseWriter) {
        for (name, value) in &self.headers {
            w.headers_mut().append(name, value.clone());
        }
        w.write_status(self.status);
        w.body.extend_from_slice(&self.body);
    }
}

impl StatusOverride for Response {
    fn set_status(&mut self, code: StatusCode) { self.status = code; }
}

impl Render for &'static str {
    fn render_to(self, w: &mut ResponseWriter) { Basic::new(self).render_to(w) }
}

impl Render for String {
    fn render_to(self, w: &mut ResponseWriter) { Basic::new(self).render_to(w) }
}

/// Return a [`StatusCode`] directly from an action: `return StatusCode::NOT_FOUND`
impl Render for StatusCode {
    fn render_to(self, w: &mut ResponseWriter) { w.write_status(self) }
}

impl<T: Render, E: Render> Render for Result<T, E> {
    fn render_to(self, w: &mut ResponseWriter) {
        match self {
            Ok(ok) => ok.render_to(w),
            Err(err) => err.render_to(w),
        }
    }
}

// ── Basic ────────────────────────────────────────────────────────────────────

/// A text body with an optional status (default `200 OK`).
#[derive(Clone, Debug)]
pub struct Basic {
    content: String,
    status: Option<StatusCode>,
}

impl Basic {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), status: None }
    }
}

impl Render for Basic {
    fn render_to(self, w: &mut ResponseWriter) {
        w.set_header(CONTENT_TYPE, HeaderValue::from_static(TEXT));
        if let Some(code) = self.status {
            w.write_status(code);
        }
        w.write(self.content.as_bytes());
    }
}

impl StatusOverride for Basic {
    fn set_status(&mut self, code: StatusCode) { self.status = Some(code); }
}

// ── Error ────────────────────────────────────────────────────────────────────

/// A status code with the error message as body.
#[derive(Clone, Debug)]
pub struct Error {
    status: StatusCode,
    message: String,
}

impl Error {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl Render for Error {
    fn render_to(self, w: &mut ResponseWriter) {
        w.set_header(CONTENT_TYPE, HeaderValue::from_static(TEXT));
        w.write_status(self.status);
        w.write(self.message.as_bytes());
    }
}

impl StatusOverride for Error {
    fn set_status(&mut self, code: StatusCode) { self.status = code; }
}

// ── Json ─────────────────────────────────────────────────────────────────────

/// A serde payload rendered as two-space indented JSON.
///
/// If serialisation fails the response becomes `500 Internal Server Error`
/// with the serde error message as a plain-text body.
#[derive(Clone, Debug)]
pub struct Json<T> {
    data: T,
    status: Option<StatusCode>,
}

impl<T: Serialize> Json<T> {
    pub fn new(data: T) -> Self {
        Self { data, status: None }
    }
}

impl<T: Serialize> Render for Json<T> {
    fn render_to(self, w: &mut ResponseWriter) {
        match serde_json::to_vec_pretty(&self.data) {
            Ok(body) => {
                w.set_header(CONTENT_TYPE, HeaderValue::from_static(JSON));
                if let Some(code) = self.status {
                    w.write_status(code);
                }
                w.write(&body);
            }
            Err(e) => {
                tracing::error!("json serialisation failed: {e}");
                w.set_header(CONTENT_TYPE, HeaderValue::from_static(TEXT));
                w.write_status(StatusCode::INTERNAL_SERVER_ERROR);
                w.write(e.to_string().as_bytes());
            }
        }
    }
}

impl<T> StatusOverride for Json<T> {
    fn set_status(&mut self, code: StatusCode) { self.status = Some(code); }
}
