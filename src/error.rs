//! Unified error type.

use std::fmt;

/// The error type returned by txlog's fallible operations.
///
/// Logging itself never fails: a record that cannot be built or written is
/// dropped silently. This type surfaces infrastructure failures only:
/// binding to a port, accepting a connection, or reading configuration.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// An environment variable held a value that could not be parsed.
    Config { key: &'static str, value: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Config { key, value } => write!(f, "config: invalid value {value:?} for {key}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config { .. } => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
