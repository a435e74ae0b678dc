//! Incoming HTTP request type.

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

use crate::config::BindConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::Error;
use crate::source::{PathParams, QueryValues, RequestValues};
use crate::value::{Bindable, Value};

/// An incoming HTTP request with its body already buffered.
///
/// The query string is decoded once on construction, and so is the body when
/// it is sent as `application/x-www-form-urlencoded`.
///
/// Declare an `Arc<Request>` argument on a wrapped action to receive the
/// request itself.
pub struct Request {
    parts: Parts,
    body: Bytes,
    params: PathParams,
    query: QueryValues,
    form: Option<QueryValues>,
}

impl Request {
    pub fn new(parts: Parts, body: Bytes, params: PathParams) -> Self {
        let query = QueryValues::parse(parts.uri.query().unwrap_or_default().as_bytes());
        let form = is_form(&parts.headers).then(|| QueryValues::parse(&body));
        Self { parts, body, params, query, form }
    }

    /// Builds a request from an `http::Request`, taking path variables from
    /// a [`PathParams`] extension if the router left one.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (mut parts, body) = req.into_parts();
        let params = parts.extensions.remove::<PathParams>().unwrap_or_default();
        Self::new(parts, body, params)
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn path_params(&self) -> &PathParams { &self.params }
    pub fn query(&self) -> &QueryValues { &self.query }
    pub fn form(&self) -> Option<&QueryValues> { self.form.as_ref() }

    /// Case-insensitive header lookup. Non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub(crate) fn values(&self, config: &BindConfig) -> RequestValues<'_> {
        RequestValues {
            path: &self.params,
            query: &self.query,
            form: self.form.as_ref().filter(|_| config.form_body),
            colon_params: config.colon_params,
        }
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers.get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

impl Bindable for Arc<Request> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::special::<Arc<Request>>()
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        value.downcast::<Request>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = http::Request::builder().method(Method::POST).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        Request::from_http(builder.body(Bytes::from_static(body.as_bytes())).unwrap())
    }

    #[test]
    fn form_body_is_decoded_only_for_form_content_type() {
        let form = request("/x?a=1", Some("application/x-www-form-urlencoded; charset=utf-8"), "b=2");
        assert_eq!(form.form().and_then(|f| crate::ValueSource::value(f, "b")), Some("2"));

        let json = request("/x?a=1", Some("application/json"), r#"{"b":2}"#);
        assert!(json.form().is_none());
    }

    #[test]
    fn path_params_come_from_extensions() {
        let mut req = http::Request::builder().uri("/users/42").body(Bytes::new()).unwrap();
        req.extensions_mut().insert::<PathParams>([("id", "42")].into_iter().collect());
        let req = Request::from_http(req);
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.path(), "/users/42");
    }
}
