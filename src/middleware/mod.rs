//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. A middleware receives the request and a [`Next`]
//! handle to the rest of the chain; it may inspect or replace the request,
//! must call [`Next::run`] to reach the handler (or answer itself), and may
//! inspect or rewrap the response on the way out.
//!
//! ```text
//! Router::new().layer(a).layer(b)
//!
//!   request → a → b → handler
//!   response ← a ← b ←
//! ```
//!
//! The chain ends in a [`Handler`]. Middleware and handlers are both erased
//! behind `Arc<dyn _>` and both return a [`BoxFuture`], so the router can
//! hold any mix of them and [`Next`] walks the chain one vtable call per step.
//!
//! Built-in middleware:
//! - [`RequestLogger`]: one structured transaction record per request

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

mod request_log;

pub use request_log::RequestLogger;

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// The end of a middleware chain: turns a request into a response.
///
/// Any `async fn(Request) -> impl IntoResponse` (or closure returning such
/// a future) is a handler. Types holding state can implement it directly.
pub trait Handler: Send + Sync + 'static {
    fn respond(&self, req: Request) -> BoxFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn respond(&self, req: Request) -> BoxFuture {
        let fut = self(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// A request interceptor.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type BoxedHandler = Arc<dyn Handler>;

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the chain after the current middleware.
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    index: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, endpoint: BoxedHandler) -> Self {
        Self { stack, index: 0, endpoint }
    }

    /// Runs the next middleware, or the handler once the stack is exhausted.
    pub async fn run(self, req: Request) -> Response {
        self.call(req).await
    }

    pub(crate) fn call(self, req: Request) -> BoxFuture {
        match self.stack.get(self.index) {
            Some(middleware) => {
                let middleware = Arc::clone(middleware);
                let next = Next { index: self.index + 1, ..self };
                middleware.handle(req, next)
            }
            None => self.endpoint.respond(req),
        }
    }
}

/// Adapts an async closure `(Request, Next) -> impl IntoResponse` into middleware.
///
/// ```rust
/// use txlog::{Request, middleware::{self, Next}};
///
/// let tag = middleware::from_fn(|mut req: Request, next: Next| async move {
///     req.headers_mut().insert("x-seen", http::HeaderValue::from_static("1"));
///     next.run(req).await
/// });
/// ```
pub fn from_fn<F, Fut, R>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FromFn(f)
}

/// Middleware returned by [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut, R> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}
