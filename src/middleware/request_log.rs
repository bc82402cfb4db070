//! Transaction logging: one structured record per request.
//!
//! # What happens per request
//!
//! 1. The start time is taken and the trace context resolved.
//! 2. The request body is buffered and an in-memory copy is put back, so the
//!    handler reads exactly the bytes the client sent.
//! 3. The rest of the chain runs.
//! 4. The response body is wrapped in [`CaptureBody`]: every frame hyper pulls
//!    towards the client is forwarded untouched and mirrored into a buffer.
//! 5. When the body ends (or is dropped because the client went away) the
//!    end time is taken and the [`TransactionRecord`] is emitted, exactly once.
//!
//! Because the record is finalised by the body, `Duration` covers both the
//! handler and the time spent streaming the response out.
//!
//! # Failure handling
//!
//! Logging is best-effort. A request body that cannot be read is logged (and
//! forwarded) as empty; a record that cannot be serialized becomes an empty
//! line. Neither changes the status or bytes the client receives.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use hyper::body::{Body as HttpBody, Frame, SizeHint};

use crate::body::{Body, BoxError};
use crate::config::LoggerConfig;
use crate::emit::{self, RecordSink, StdStreams, Stream};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::record::{self, HeaderValues, TRANSACTION_LEVEL, TransactionRecord};
use crate::request::Request;
use crate::response::Response;
use crate::trace::{TraceContext, TraceContextProvider, W3cTraceContext};

/// Middleware that writes one [`TransactionRecord`] per request to stdout.
///
/// ```rust,no_run
/// use http::Method;
/// use txlog::{Request, Response, Router, Server, middleware::RequestLogger};
///
/// # async fn run() -> Result<(), txlog::Error> {
/// let app = Router::new()
///     .layer(RequestLogger::new("orders"))
///     .on(Method::GET, "/health", health);
///
/// Server::bind("0.0.0.0:3000").serve(app).await
/// # }
/// async fn health(_req: Request) -> Response {
///     Response::json(r#"{"ok":true}"#)
/// }
/// ```
pub struct RequestLogger {
    config: Arc<LoggerConfig>,
    sink: Arc<dyn RecordSink>,
    traces: Arc<dyn TraceContextProvider>,
}

impl RequestLogger {
    /// Logs under `application`, with default settings.
    pub fn new(application: impl Into<String>) -> Self {
        Self::with_config(LoggerConfig::new(application))
    }

    pub fn with_config(config: LoggerConfig) -> Self {
        Self {
            config: Arc::new(config),
            sink: Arc::new(StdStreams),
            traces: Arc::new(W3cTraceContext),
        }
    }

    /// Sends records to `sink` instead of the process's stdout.
    pub fn sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Resolves trace and span IDs with `provider` instead of [`W3cTraceContext`].
    pub fn trace_provider(mut self, provider: impl TraceContextProvider) -> Self {
        self.traces = Arc::new(provider);
        self
    }
}

impl Middleware for RequestLogger {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        let config = Arc::clone(&self.config);
        let sink = Arc::clone(&self.sink);
        let traces = Arc::clone(&self.traces);

        Box::pin(async move {
            let start = Utc::now();

            let trace = traces.trace_context(&req);
            if !trace.is_empty() && req.extensions().get::<TraceContext>().is_none() {
                req.extensions_mut().insert(trace.clone());
            }

            let request_body = match req.read_body().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(error = %e, "request body unreadable, logging it as empty");
                    Bytes::new()
                }
            };

            let request = RequestSnapshot {
                method: req.method().to_string(),
                uri: request_uri(&req),
                headers: record::header_values(req.headers()),
                body: config.body_text(&request_body),
            };
            drop(request_body);

            let response = next.run(req).await;

            let (parts, body) = response.into_parts();
            let pending = Pending {
                start,
                status: parts.status.as_u16(),
                response_headers: record::header_values(&parts.headers),
                request,
                trace,
                config,
                sink,
            };
            Response::from_parts(parts, CaptureBody::new(body, pending).boxed_unsync())
        })
    }
}

/// Path and query exactly as the client sent them.
fn request_uri(req: &Request) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| req.uri().to_string())
}

struct RequestSnapshot {
    method: String,
    uri: String,
    headers: HeaderValues,
    body: String,
}

/// Everything known about the transaction before the response body is sent.
struct Pending {
    start: DateTime<Utc>,
    status: u16,
    response_headers: HeaderValues,
    request: RequestSnapshot,
    trace: TraceContext,
    config: Arc<LoggerConfig>,
    sink: Arc<dyn RecordSink>,
}

impl Pending {
    fn into_record(self, end: DateTime<Utc>, response_body: &[u8], size: usize) -> TransactionRecord {
        TransactionRecord {
            status: self.status,
            start: self.start,
            end,
            request_body: self.request.body,
            request_header: self.request.headers,
            response_body: self.config.body_text(response_body),
            response_header: self.response_headers,
            trace_id: self.trace.trace_id().to_owned(),
            span_id: self.trace.span_id().to_owned(),
            duration: (end - self.start).num_milliseconds(),
            request_method: self.request.method,
            hostname: crate::hostname::hostname().to_owned(),
            logging_time: end,
            level: TRANSACTION_LEVEL.to_owned(),
            application: self.config.application.clone(),
            api_url: self.request.uri,
            size,
        }
    }
}

// ── CaptureBody ───────────────────────────────────────────────────────────────

/// Response body decorator: forwards every frame and mirrors its data.
///
/// Emits the transaction record on end-of-stream or drop, whichever comes
/// first. `Pending` is taken on emission, so the record is written once.
struct CaptureBody {
    inner: Body,
    captured: BytesMut,
    size: usize,
    pending: Option<Pending>,
}

impl CaptureBody {
    fn new(inner: Body, pending: Pending) -> Self {
        Self { inner, captured: BytesMut::new(), size: 0, pending: Some(pending) }
    }

    fn capture(&mut self, data: &Bytes) {
        self.size += data.len();
        let room = match self.pending.as_ref().and_then(|p| p.config.max_body_bytes) {
            Some(limit) => limit.saturating_sub(self.captured.len()),
            None => data.len(),
        };
        self.captured.extend_from_slice(&data[..data.len().min(room)]);
    }

    fn finish(&mut self) {
        let Some(pending) = self.pending.take() else { return };
        let end = Utc::now().max(pending.start);
        let sink = Arc::clone(&pending.sink);
        let record = pending.into_record(end, &self.captured, self.size);
        emit::emit(sink.as_ref(), Stream::Stdout, &record);
    }
}

impl HttpBody for CaptureBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.capture(data);
                }
            }
            Poll::Ready(None) => this.finish(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CaptureBody {
    fn drop(&mut self) {
        self.finish();
    }
}
