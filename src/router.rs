//! Radix-tree request router with a middleware stack.
//!
//! One tree per HTTP method. O(path-length) lookup. Middleware registered
//! with [`Router::layer`] wraps every request, matched or not, so a request
//! logger also sees the 404s.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::middleware::{BoxedHandler, BoxedMiddleware, Handler, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each builder call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    middleware: Vec<BoxedMiddleware>,
    stack: Arc<[BoxedMiddleware]>,
    fallback: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            middleware: Vec::new(),
            stack: Arc::from(Vec::new()),
            fallback: Arc::new(not_found),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use http::Method;
    /// # use txlog::{Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, Arc::new(handler) as BoxedHandler)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Wraps every request in `middleware`.
    ///
    /// The first layer registered is the outermost: it sees the request
    /// first and the response last.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self.stack = Arc::from(self.middleware.clone());
        self
    }

    /// Runs `req` through the middleware stack and the matching handler.
    pub async fn call(&self, mut req: Request) -> Response {
        let endpoint = match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler
            }
            None => Arc::clone(&self.fallback),
        };
        Next::new(Arc::clone(&self.stack), endpoint).run(req).await
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_req: Request) -> StatusCode {
    StatusCode::NOT_FOUND
}
