//! # txlog
//!
//! Transaction logging for HTTP services: one structured JSON line per
//! request, plus one-off debug lines tagged with trace context and call site.
//!
//! ## The contract
//!
//! For every request, [`RequestLogger`](middleware::RequestLogger) writes a
//! single line to stdout:
//!
//! ```text
//! {"ResponseCode":200,"Start":"…","End":"…","RequestBody":"","RequestHeader":{…},
//!  "ResponseBody":"{\"ok\":true}","ResponseHeader":{…},"trace_id":"","span_id":"",
//!  "Duration":5,"RequestMethod":"GET","Hostname":"web-1","LoggingTime":"…",
//!  "Level":"INFO","Application":"orders","ApiUrl":"/health","Size":11}
//! ```
//!
//! Debug records from [`log_debug_message`](debug::log_debug_message) go to
//! stderr. Logging is best-effort: nothing in it can fail a request or change
//! the bytes a client receives.
//!
//! What txlog intentionally ignores — ship stdout to your log pipeline:
//!
//! - **Persistence and rotation**
//! - **Sampling and batching**
//! - **Network transport of records**
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use txlog::{Request, Response, Router, Server, debug::log_debug_message};
//! use txlog::middleware::RequestLogger;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .layer(RequestLogger::new("orders"))
//!         .on(Method::GET,  "/health",      health)
//!         .on(Method::POST, "/orders",      create_order);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn health(_req: Request) -> Response {
//!     Response::json(r#"{"ok":true}"#)
//! }
//!
//! async fn create_order(req: Request) -> Response {
//!     let cx = req.trace_context();
//!     let body = req.into_bytes().await.unwrap_or_default();
//!     if body.is_empty() {
//!         log_debug_message(&cx, "orders", "empty order rejected", "REJECTED", "WARN");
//!         return Response::status(http::StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(http::StatusCode::CREATED)
//!         .json(body)
//! }
//! ```

mod error;
mod request;
mod response;
mod router;
mod server;

pub mod body;
pub mod config;
pub mod debug;
pub mod emit;
pub mod hostname;
pub mod middleware;
pub mod record;
pub mod trace;

pub use config::LoggerConfig;
pub use error::Error;
pub use middleware::{BoxFuture, Handler};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use trace::{TraceContext, TraceContextProvider};
