//! Trace context: the trace and span identifiers attached to a request.
//!
//! txlog does not run a tracer. It only needs the two identifiers so records
//! can be correlated with whatever distributed-tracing system the service
//! uses. Where they come from is a [`TraceContextProvider`]:
//!
//! | Provider | Source |
//! |---|---|
//! | [`ExtensionTraceContext`] | a [`TraceContext`] inserted into request extensions by upstream middleware |
//! | [`W3cTraceContext`] (default) | extensions first, then the W3C `traceparent` header |
//!
//! A request without any context yields empty identifiers, never an error.

use crate::request::Request;

/// W3C Trace Context propagation header.
pub const TRACEPARENT: &str = "traceparent";

/// Trace and span identifiers, empty when no trace is active.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: String,
    span_id: String,
}

impl TraceContext {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self { trace_id: trace_id.into(), span_id: span_id.into() }
    }

    pub fn trace_id(&self) -> &str { &self.trace_id }
    pub fn span_id(&self) -> &str { &self.span_id }

    pub fn is_empty(&self) -> bool {
        self.trace_id.is_empty() && self.span_id.is_empty()
    }

    /// Parses a `traceparent` header value: `{version}-{trace-id}-{parent-id}-{flags}`.
    ///
    /// Returns `None` for malformed values, the reserved version `ff`, and
    /// all-zero trace or span IDs, which the W3C format defines as invalid.
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let span_id = parts.next()?;
        let flags = parts.next()?;

        // Version 00 has exactly four fields; later versions may append more.
        if version == "00" && parts.next().is_some() {
            return None;
        }
        if !is_lower_hex(version, 2) || version == "ff" || !is_lower_hex(flags, 2) {
            return None;
        }
        if !is_lower_hex(trace_id, 32) || !is_lower_hex(span_id, 16) {
            return None;
        }
        if is_all_zero(trace_id) || is_all_zero(span_id) {
            return None;
        }

        Some(Self::new(trace_id, span_id))
    }
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_all_zero(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

// ── Providers ─────────────────────────────────────────────────────────────────

/// Source of the trace context for an in-flight request.
pub trait TraceContextProvider: Send + Sync + 'static {
    /// Returns the request's trace context, or [`TraceContext::default`].
    fn trace_context(&self, req: &Request) -> TraceContext;
}

/// Reads a [`TraceContext`] placed in the request extensions.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtensionTraceContext;

impl TraceContextProvider for ExtensionTraceContext {
    fn trace_context(&self, req: &Request) -> TraceContext {
        req.trace_context()
    }
}

/// Request extensions first, then the `traceparent` header.
#[derive(Clone, Copy, Debug, Default)]
pub struct W3cTraceContext;

impl TraceContextProvider for W3cTraceContext {
    fn trace_context(&self, req: &Request) -> TraceContext {
        if let Some(cx) = req.extensions().get::<TraceContext>() {
            return cx.clone();
        }
        req.header(TRACEPARENT)
            .and_then(TraceContext::from_traceparent)
            .unwrap_or_default()
    }
}

impl<F> TraceContextProvider for F
where
    F: Fn(&Request) -> TraceContext + Send + Sync + 'static,
{
    fn trace_context(&self, req: &Request) -> TraceContext {
        self(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body;

    const TRACE: &str = "4bf92f3577b34da6a3ce929d0e0e4736";
    const SPAN: &str = "00f067aa0ba902b7";

    fn request(traceparent: Option<&str>) -> Request {
        let mut builder = http::Request::get("/orders");
        if let Some(value) = traceparent {
            builder = builder.header(TRACEPARENT, value);
        }
        builder.body(body::empty()).unwrap().into()
    }

    #[test]
    fn parses_valid_traceparent() {
        let cx = TraceContext::from_traceparent(&format!("00-{TRACE}-{SPAN}-01")).unwrap();
        assert_eq!(cx.trace_id(), TRACE);
        assert_eq!(cx.span_id(), SPAN);
    }

    #[test]
    fn rejects_malformed_traceparent() {
        let zero_trace = "0".repeat(32);
        let zero_span = "0".repeat(16);
        let upper = TRACE.to_ascii_uppercase();
        for bad in [
            String::new(),
            "garbage".to_owned(),
            format!("00-{TRACE}-{SPAN}"),
            format!("00-{TRACE}-{SPAN}-01-extra"),
            format!("ff-{TRACE}-{SPAN}-01"),
            format!("00-{zero_trace}-{SPAN}-01"),
            format!("00-{TRACE}-{zero_span}-01"),
            format!("00-{upper}-{SPAN}-01"),
            format!("00-{TRACE}-{SPAN}-1"),
        ] {
            assert_eq!(TraceContext::from_traceparent(&bad), None, "{bad}");
        }
    }

    #[test]
    fn future_versions_may_carry_extra_fields() {
        let cx = TraceContext::from_traceparent(&format!("01-{TRACE}-{SPAN}-01-what-ever"));
        assert!(cx.is_some());
    }

    #[test]
    fn w3c_provider_prefers_extensions_over_header() {
        let mut req = request(Some(&format!("00-{TRACE}-{SPAN}-01")));
        assert_eq!(W3cTraceContext.trace_context(&req).trace_id(), TRACE);

        req.extensions_mut().insert(TraceContext::new("upstream", "span"));
        assert_eq!(W3cTraceContext.trace_context(&req).trace_id(), "upstream");
    }

    #[test]
    fn missing_context_is_empty() {
        let req = request(None);
        assert!(W3cTraceContext.trace_context(&req).is_empty());
        assert!(ExtensionTraceContext.trace_context(&req).is_empty());
    }

    #[test]
    fn closures_are_providers() {
        let provider = |_: &Request| TraceContext::new("t", "s");
        assert_eq!(provider.trace_context(&request(None)).span_id(), "s");
    }
}
