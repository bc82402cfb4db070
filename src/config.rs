//! Logger configuration, in code or from the environment.

use crate::error::Error;

/// Application name reported in records.
pub const APPLICATION_ENV: &str = "TXLOG_APPLICATION";

/// Optional cap, in bytes, on the logged copy of request and response bodies.
pub const MAX_BODY_BYTES_ENV: &str = "TXLOG_MAX_BODY_BYTES";

/// Application name used when none is configured.
pub const DEFAULT_APPLICATION: &str = "unknown";

/// Request logger settings.
///
/// The `Hostname` field is not configured here: it comes from
/// [`hostname()`](crate::hostname::hostname), so transaction and debug
/// records always agree on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Reported as `Application` in every record.
    pub application: String,
    /// Logged bodies are truncated to this many bytes. `None` logs them whole.
    ///
    /// Only the logged copy is truncated; handlers and clients always see
    /// the full body.
    pub max_body_bytes: Option<usize>,
}

impl LoggerConfig {
    pub fn new(application: impl Into<String>) -> Self {
        Self { application: application.into(), max_body_bytes: None }
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    /// Reads `TXLOG_APPLICATION` and `TXLOG_MAX_BODY_BYTES`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let application = lookup(APPLICATION_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_APPLICATION.to_owned());

        let max_body_bytes = match lookup(MAX_BODY_BYTES_ENV) {
            Some(raw) => Some(raw.trim().parse().map_err(|_| Error::Config {
                key: MAX_BODY_BYTES_ENV,
                value: raw.clone(),
            })?),
            None => None,
        };

        Ok(Self { application, max_body_bytes })
    }

    /// `bytes` as text, cut to `max_body_bytes` if set.
    pub(crate) fn body_text(&self, bytes: &[u8]) -> String {
        let bytes = match self.max_body_bytes {
            Some(limit) if bytes.len() > limit => &bytes[..limit],
            _ => bytes,
        };
        String::from_utf8_lossy(bytes).into_owned()
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_APPLICATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = LoggerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LoggerConfig::default());
        assert_eq!(config.application, DEFAULT_APPLICATION);
    }

    #[test]
    fn reads_all_variables() {
        let config = LoggerConfig::from_lookup(lookup(&[
            (APPLICATION_ENV, "billing"),
            (MAX_BODY_BYTES_ENV, " 4096 "),
        ]))
        .unwrap();
        assert_eq!(config, LoggerConfig::new("billing").max_body_bytes(4096));
    }

    #[test]
    fn invalid_body_limit_is_a_config_error() {
        let err = LoggerConfig::from_lookup(lookup(&[(MAX_BODY_BYTES_ENV, "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: MAX_BODY_BYTES_ENV, .. }));
        assert_eq!(err.to_string(), r#"config: invalid value "lots" for TXLOG_MAX_BODY_BYTES"#);
    }

    #[test]
    fn body_text_truncates_only_when_capped() {
        let body = "x".repeat(10);
        assert_eq!(LoggerConfig::default().body_text(body.as_bytes()), body);
        assert_eq!(LoggerConfig::default().max_body_bytes(4).body_text(body.as_bytes()), "xxxx");
    }
}
