//! Ad-hoc debug records, tagged with trace context and call site.
//!
//! ```rust
//! use txlog::{TraceContext, debug::log_debug_message};
//!
//! fn refresh(cx: &TraceContext) {
//!     log_debug_message(cx, "auth", "token expired", "WARN", "WARN");
//! }
//! # refresh(&TraceContext::default());
//! ```
//!
//! The record's `Filename` and `Line` point at the line calling
//! [`log_debug_message`] (or [`DebugEmitter::emit`]), not at anything inside
//! this crate. The location is captured at compile time through
//! `#[track_caller]`; no stack walking happens at runtime.

use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::emit::{self, RecordSink, StdStreams, Stream};
use crate::record::DebugRecord;
use crate::trace::TraceContext;

/// Writes [`DebugRecord`]s to stderr (or any [`RecordSink`]).
#[derive(Clone)]
pub struct DebugEmitter {
    sink: Arc<dyn RecordSink>,
}

impl DebugEmitter {
    pub fn new() -> Self {
        Self { sink: Arc::new(StdStreams) }
    }

    pub fn sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Emits one record for the calling line.
    #[track_caller]
    pub fn emit(&self, cx: &TraceContext, component: &str, message: &str, status: &str, level: &str) {
        log_debug_message_to(self.sink.as_ref(), cx, component, message, status, level);
    }
}

impl Default for DebugEmitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Emits one debug record to stderr for the calling line.
#[track_caller]
pub fn log_debug_message(cx: &TraceContext, component: &str, message: &str, status: &str, level: &str) {
    log_debug_message_to(&StdStreams, cx, component, message, status, level);
}

/// Same as [`log_debug_message`], writing to `sink`.
#[track_caller]
pub fn log_debug_message_to(
    sink: &dyn RecordSink,
    cx: &TraceContext,
    component: &str,
    message: &str,
    status: &str,
    level: &str,
) {
    let caller = Location::caller();
    let record = DebugRecord {
        trace_id: cx.trace_id().to_owned(),
        level: level.to_owned(),
        line: caller.line(),
        filename: base_name(caller.file()),
        hostname: crate::hostname::hostname().to_owned(),
        logging_time: Utc::now(),
        status: status.to_owned(),
        message: message.to_owned(),
        application: component.to_owned(),
    };
    emit::emit(sink, Stream::Stderr, &record);
}

fn base_name(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_owned())
}
