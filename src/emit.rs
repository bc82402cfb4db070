//! Record emission: one JSON line, one write.
//!
//! Transaction records go to [`Stream::Stdout`], debug records to
//! [`Stream::Stderr`]. Where those streams actually lead is decided by a
//! [`RecordSink`]; [`StdStreams`] maps them onto the process streams.
//!
//! Nothing in here returns an error. A record that fails to serialize is
//! written as an empty line and a write that fails is dropped; both are
//! reported through `tracing` at debug level.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// Logical output stream of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Primary output: transaction records.
    Stdout,
    /// Diagnostic output: debug records.
    Stderr,
}

/// Destination for newline-terminated record lines.
///
/// `write_line` is called exactly once per record, synchronously, with the
/// complete line including its trailing `\n`.
pub trait RecordSink: Send + Sync {
    fn write_line(&self, stream: Stream, line: &[u8]);
}

/// Writes to the process's stdout / stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdStreams;

impl RecordSink for StdStreams {
    fn write_line(&self, stream: Stream, line: &[u8]) {
        // Locked so a line from one request never interleaves with another's.
        match stream {
            Stream::Stdout => write_record(std::io::stdout().lock(), stream, line),
            Stream::Stderr => write_record(std::io::stderr().lock(), stream, line),
        }
    }
}

fn write_record(mut out: impl Write, stream: Stream, line: &[u8]) {
    if let Err(e) = out.write_all(line).and_then(|()| out.flush()) {
        tracing::debug!(error = %e, ?stream, "record write failed, dropping it");
    }
}

/// Keeps every line in memory, per stream.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Stream, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written to `stream`, in write order, without their trailing newline.
    pub fn lines(&self, stream: Stream) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl RecordSink for MemorySink {
    fn write_line(&self, stream: Stream, line: &[u8]) {
        let line = String::from_utf8_lossy(line.strip_suffix(b"\n").unwrap_or(line)).into_owned();
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((stream, line));
    }
}

/// Serializes `record` as compact JSON and writes it to `stream` as one line.
pub fn emit<T: Serialize>(sink: &dyn RecordSink, stream: Stream, record: &T) {
    let mut line = serde_json::to_vec(record).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "record failed to serialize, emitting an empty line");
        Vec::new()
    });
    line.push(b'\n');
    sink.write_line(stream, &line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, Serializer};
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Line {
        #[serde(rename = "Message")]
        message: &'static str,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("nope"))
        }
    }

    #[test]
    fn writes_one_compact_line_per_record() {
        let sink = MemorySink::new();
        emit(&sink, Stream::Stdout, &Line { message: "a" });
        emit(&sink, Stream::Stderr, &Line { message: "b" });
        emit(&sink, Stream::Stdout, &Line { message: "c" });

        assert_eq!(sink.lines(Stream::Stdout), [r#"{"Message":"a"}"#, r#"{"Message":"c"}"#]);
        assert_eq!(sink.lines(Stream::Stderr), [r#"{"Message":"b"}"#]);
    }

    #[test]
    fn serialization_failure_emits_empty_line() {
        let sink = MemorySink::new();
        emit(&sink, Stream::Stdout, &Unserializable);
        assert_eq!(sink.lines(Stream::Stdout), [""]);
    }

    struct Recording(Mutex<Vec<Vec<u8>>>);

    impl RecordSink for Recording {
        fn write_line(&self, _: Stream, line: &[u8]) {
            self.0.lock().unwrap().push(line.to_vec());
        }
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Collects formatted `tracing` output.
    #[derive(Clone, Default)]
    struct Logs(Arc<Mutex<Vec<u8>>>);

    impl Write for Logs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_is_reported_not_raised() {
        let logs = Logs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            write_record(Closed, Stream::Stdout, b"{}\n");
        });

        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("record write failed"), "{logs}");
        assert!(logs.contains("Stdout"), "{logs}");
    }

    #[test]
    fn record_is_written_whole() {
        let mut out = Vec::new();
        write_record(&mut out, Stream::Stderr, b"{\"Message\":\"x\"}\n");
        assert_eq!(out, b"{\"Message\":\"x\"}\n");
    }

    #[test]
    fn line_is_newline_terminated_single_write() {
        let sink = Recording(Mutex::new(Vec::new()));
        emit(&sink, Stream::Stderr, &Line { message: "x" });
        let writes = sink.0.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], b"{\"Message\":\"x\"}\n");
    }
}
