//! Minimal txlog example — JSON endpoints behind the request logger.
//!
//! Run with:
//!   RUST_LOG=info TXLOG_APPLICATION=users cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/health
//!   curl http://localhost:3000/users/42 \
//!        -H 'traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!
//! Transaction records appear on stdout, debug records on stderr.

use http::{Method, StatusCode};
use txlog::debug::log_debug_message;
use txlog::middleware::RequestLogger;
use txlog::{LoggerConfig, Request, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), txlog::Error> {
    tracing_subscriber::fmt::init();

    let config = LoggerConfig::from_env()?;

    let app = Router::new()
        .layer(RequestLogger::with_config(config))
        .on(Method::GET,  "/health",     health)
        .on(Method::GET,  "/users/{id}", get_user)
        .on(Method::POST, "/users",      create_user);

    Server::bind("0.0.0.0:3000").serve(app).await
}

async fn health(_req: Request) -> Response {
    Response::json(r#"{"ok":true}"#)
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    log_debug_message(&req.trace_context(), "users", &format!("lookup {id}"), "OK", "DEBUG");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// POST /users
//
// The logger has already read the body once; the handler still gets all of it.
async fn create_user(req: Request) -> Response {
    let cx = req.trace_context();
    let body = req.into_bytes().await.unwrap_or_default();
    if body.is_empty() {
        log_debug_message(&cx, "users", "empty create request", "REJECTED", "WARN");
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#)
}
