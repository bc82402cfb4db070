//! Hostname resolution, once per process.
//!
//! Every record, transaction or debug, is stamped with [`hostname()`]. The
//! value is fixed the first time it is asked for:
//!
//! 1. a name passed to [`init`] before any record was written, else
//! 2. `TXLOG_HOSTNAME`, when set and non-empty, else
//! 3. the OS hostname, else
//! 4. [`UNKNOWN_HOSTNAME`].

use std::io;
use std::sync::OnceLock;

/// Substituted when the hostname cannot be resolved or is empty.
pub const UNKNOWN_HOSTNAME: &str = "unknown";

/// Optional fixed hostname, bypassing OS resolution.
pub const HOSTNAME_ENV: &str = "TXLOG_HOSTNAME";

static PROCESS: HostnameCache = HostnameCache::new();

/// A hostname resolved at most once, then served from memory.
///
/// Concurrent first callers block on the single initialisation and all
/// observe the value it produced.
#[derive(Debug, Default)]
pub struct HostnameCache {
    value: OnceLock<String>,
}

impl HostnameCache {
    pub const fn new() -> Self {
        Self { value: OnceLock::new() }
    }

    /// Returns the cached hostname, resolving it from `TXLOG_HOSTNAME` or
    /// the OS on first use.
    pub fn get(&self) -> &str {
        self.get_or_resolve(configured_hostname)
    }

    /// Returns the cached hostname, calling `resolve` if nothing is cached yet.
    ///
    /// `resolve` runs at most once over the lifetime of the cache. An error or
    /// an empty name is replaced by [`UNKNOWN_HOSTNAME`].
    pub fn get_or_resolve<F>(&self, resolve: F) -> &str
    where
        F: FnOnce() -> io::Result<String>,
    {
        self.value.get_or_init(|| match resolve() {
            Ok(host) if !host.is_empty() => host,
            Ok(_) => {
                tracing::debug!("hostname resolved to an empty string, using {UNKNOWN_HOSTNAME:?}");
                UNKNOWN_HOSTNAME.to_owned()
            }
            Err(e) => {
                tracing::debug!(error = %e, "hostname resolution failed, using {UNKNOWN_HOSTNAME:?}");
                UNKNOWN_HOSTNAME.to_owned()
            }
        })
    }
}

/// The process-wide cached hostname.
pub fn hostname() -> &'static str {
    PROCESS.get()
}

/// Fixes the process hostname to `name`.
///
/// Returns `false`, leaving the cached value alone, when the hostname was
/// already resolved or initialised.
pub fn init(name: impl Into<String>) -> bool {
    let mut seeded = false;
    PROCESS.get_or_resolve(|| {
        seeded = true;
        Ok(name.into())
    });
    seeded
}

fn configured_hostname() -> io::Result<String> {
    match std::env::var(HOSTNAME_ENV) {
        Ok(host) if !host.is_empty() => Ok(host),
        _ => system_hostname(),
    }
}

fn system_hostname() -> io::Result<String> {
    Ok(::hostname::get()?.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn failure_falls_back_to_unknown() {
        let cache = HostnameCache::new();
        let host = cache.get_or_resolve(|| Err(io::Error::other("no uts namespace")));
        assert_eq!(host, UNKNOWN_HOSTNAME);
    }

    #[test]
    fn empty_name_falls_back_to_unknown() {
        let cache = HostnameCache::new();
        assert_eq!(cache.get_or_resolve(|| Ok(String::new())), UNKNOWN_HOSTNAME);
    }

    #[test]
    fn resolved_once_then_cached() {
        let cache = HostnameCache::new();
        assert_eq!(cache.get_or_resolve(|| Ok("web-1".to_owned())), "web-1");
        assert_eq!(cache.get_or_resolve(|| Ok("web-2".to_owned())), "web-1");
        assert_eq!(cache.get(), "web-1");
    }

    #[test]
    fn concurrent_first_use_resolves_exactly_once() {
        const CALLERS: usize = 16;

        let cache = Arc::new(HostnameCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_resolve(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(10));
                            Ok(format!("host-{i}"))
                        })
                        .to_owned()
                })
            })
            .collect();

        let seen: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(seen.iter().all(|h| h == &seen[0]));
    }

    #[test]
    fn process_hostname_is_stable_and_non_empty() {
        let first = hostname();
        assert!(!first.is_empty());
        assert_eq!(hostname(), first);
    }

    #[test]
    fn init_never_replaces_a_resolved_hostname() {
        let first = hostname();
        assert!(!init("late-init"));
        assert_eq!(hostname(), first);
    }
}
