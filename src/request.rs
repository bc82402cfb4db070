//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};
use http_body_util::BodyExt;

use crate::body::{self, Body, BoxError};
use crate::trace::TraceContext;

/// An incoming HTTP request plus the path parameters matched by the router.
pub struct Request {
    inner: http::Request<Body>,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(inner: http::Request<Body>, params: HashMap<String, String>) -> Self {
        Self { inner, params }
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub fn method(&self) -> &Method { self.inner.method() }
    pub fn uri(&self) -> &Uri { self.inner.uri() }
    pub fn path(&self) -> &str { self.inner.uri().path() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { self.inner.headers_mut() }
    pub fn extensions(&self) -> &Extensions { self.inner.extensions() }
    pub fn extensions_mut(&mut self) -> &mut Extensions { self.inner.extensions_mut() }

    /// Case-insensitive header lookup. Returns the first value that is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers()
            .get_all(name)
            .iter()
            .find_map(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The trace context attached to this request, or an empty one.
    pub fn trace_context(&self) -> TraceContext {
        self.inner.extensions()
            .get::<TraceContext>()
            .cloned()
            .unwrap_or_default()
    }

    /// Buffers the whole body and puts an in-memory copy back in its place.
    ///
    /// The request stays fully readable afterwards: calling this twice, or
    /// calling [`into_bytes`](Request::into_bytes) later, yields the same
    /// bytes. On a read error the body is replaced with an empty one.
    pub async fn read_body(&mut self) -> Result<Bytes, BoxError> {
        let stream = std::mem::replace(self.inner.body_mut(), body::empty());
        let bytes = stream.collect().await?.to_bytes();
        *self.inner.body_mut() = body::full(bytes.clone());
        Ok(bytes)
    }

    /// Consumes the request and reads its body to the end.
    pub async fn into_bytes(self) -> Result<Bytes, BoxError> {
        Ok(self.inner.into_body().collect().await?.to_bytes())
    }

    pub fn into_inner(self) -> http::Request<Body> {
        self.inner
    }
}

impl From<http::Request<Body>> for Request {
    fn from(inner: http::Request<Body>) -> Self {
        Self::new(inner, HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(body: &'static str) -> Request {
        http::Request::post("/users?page=2")
            .header("content-type", "application/json")
            .body(body::full(body))
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn body_is_readable_after_read_body() {
        let mut req = post(r#"{"name":"alice"}"#);

        let first = req.read_body().await.unwrap();
        let second = req.read_body().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(req.into_bytes().await.unwrap(), Bytes::from_static(br#"{"name":"alice"}"#));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = post("");
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
        assert_eq!(req.path(), "/users");
    }

    #[test]
    fn trace_context_defaults_to_empty() {
        let mut req = post("");
        assert!(req.trace_context().is_empty());

        req.extensions_mut().insert(TraceContext::new("a".repeat(32), "b".repeat(16)));
        assert_eq!(req.trace_context().span_id(), "b".repeat(16));
    }
}
