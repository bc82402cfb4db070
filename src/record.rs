//! Structured records written by the request logger and the debug emitter.
//!
//! Field names are serialized exactly as log consumers expect them
//! (`ResponseCode`, `RequestBody`, `trace_id`, ...). Renaming a field here is
//! a breaking change for anything parsing the output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::Serialize;

/// Level stamped on every transaction record.
pub const TRANSACTION_LEVEL: &str = "INFO";

/// Canonical header name → values, in order of appearance.
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// One record per HTTP request.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    #[serde(rename = "ResponseCode")]
    pub status: u16,
    #[serde(rename = "Start")]
    pub start: DateTime<Utc>,
    #[serde(rename = "End")]
    pub end: DateTime<Utc>,
    #[serde(rename = "RequestBody")]
    pub request_body: String,
    #[serde(rename = "RequestHeader")]
    pub request_header: HeaderValues,
    #[serde(rename = "ResponseBody")]
    pub response_body: String,
    #[serde(rename = "ResponseHeader")]
    pub response_header: HeaderValues,
    #[serde(rename = "trace_id")]
    pub trace_id: String,
    #[serde(rename = "span_id")]
    pub span_id: String,
    /// Whole milliseconds between `start` and `end`.
    #[serde(rename = "Duration")]
    pub duration: i64,
    #[serde(rename = "RequestMethod")]
    pub request_method: String,
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "LoggingTime")]
    pub logging_time: DateTime<Utc>,
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Application")]
    pub application: String,
    #[serde(rename = "ApiUrl")]
    pub api_url: String,
    /// Response bytes written to the client.
    #[serde(rename = "Size")]
    pub size: usize,
}

/// An ad-hoc debug record tagged with its call site.
#[derive(Debug, Clone, Serialize)]
pub struct DebugRecord {
    #[serde(rename = "trace_id")]
    pub trace_id: String,
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Line")]
    pub line: u32,
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "LoggingTime")]
    pub logging_time: DateTime<Utc>,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Application")]
    pub application: String,
}

/// Flattens a `HeaderMap` into name → values. Non-UTF-8 values are rendered lossily.
///
/// Names are written in canonical form (`Content-Type`, `X-Request-Id`).
pub fn header_values(headers: &HeaderMap) -> HeaderValues {
    let mut map = HeaderValues::new();
    for (name, value) in headers {
        map.entry(canonical_name(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// `content-type` → `Content-Type`: the first letter and every letter after a
/// `-` upper-cased, the rest lower-cased.
pub fn canonical_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let c = if upper { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() };
            upper = c == '-';
            c
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn header_values_groups_repeated_headers_in_order() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("content-type", HeaderValue::from_static("text/plain"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.append("x-raw", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let map = header_values(&headers);
        assert_eq!(map["Set-Cookie"], vec!["a=1", "b=2"]);
        assert_eq!(map["Content-Type"], vec!["text/plain"]);
        assert_eq!(map["X-Raw"], vec!["caf\u{fffd}"]);
        assert_eq!(map.keys().collect::<Vec<_>>(), ["Content-Type", "Set-Cookie", "X-Raw"]);
    }

    #[test]
    fn header_names_are_canonicalised() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("x-b3-traceid"), "X-B3-Traceid");
        assert_eq!(canonical_name("WWW-AUTHENTICATE"), "Www-Authenticate");
        assert_eq!(canonical_name("traceparent"), "Traceparent");
        assert_eq!(canonical_name("-x"), "-X");
    }

    #[test]
    fn debug_record_uses_consumer_field_names() {
        let record = DebugRecord {
            trace_id: String::new(),
            level: "WARN".into(),
            line: 7,
            filename: "auth.rs".into(),
            hostname: "web-1".into(),
            logging_time: DateTime::from_timestamp(0, 0).unwrap(),
            status: "WARN".into(),
            message: "token expired".into(),
            application: "auth".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            ["Application", "Filename", "Hostname", "Level", "Line", "LoggingTime", "Message", "Status", "trace_id"]
        );
        assert_eq!(value["LoggingTime"], "1970-01-01T00:00:00Z");
    }
}
