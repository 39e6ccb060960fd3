//! Per-client rate limiting for import actions.
//!
//! The limiter is constructor-injected into the pipeline rather than
//! living in a global, so deployments can swap the backing store and tests
//! can shrink the window. The in-memory implementation keeps a fixed
//! window per `(client, action)` pair; clients never interfere with each
//! other.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportAction {
    UrlImport,
    TextImport,
    FileImport,
    CreatePost,
}

impl ImportAction {
    pub fn name(self) -> &'static str {
        match self {
            ImportAction::UrlImport => "url_import",
            ImportAction::TextImport => "text_import",
            ImportAction::FileImport => "file_import",
            ImportAction::CreatePost => "create_post",
        }
    }

    pub fn hourly_limit(self) -> u32 {
        match self {
            ImportAction::UrlImport => 10,
            ImportAction::TextImport => 20,
            ImportAction::FileImport => 10,
            ImportAction::CreatePost => 20,
        }
    }
}

pub trait RateLimiter: Send + Sync {
    /// Returns whether the client may perform the action now; a `true`
    /// consumes one slot from the current window.
    fn try_consume(&self, client_id: &str, action: ImportAction) -> bool;
}

#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Process-local fixed-window limiter. Expired windows are reset lazily on
/// access; a sweep runs when the map grows past a threshold so stale
/// entries from one-off clients do not accumulate unbounded.
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<(String, ImportAction), Window>>,
    window: Duration,
}

const SWEEP_THRESHOLD: usize = 4096;

impl FixedWindowLimiter {
    pub fn hourly() -> Self {
        Self::with_window(Duration::from_secs(3600))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window,
        }
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn try_consume(&self, client_id: &str, action: ImportAction) -> bool {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            // A poisoned lock means a panic mid-update; failing open here
            // would let a buggy process bypass limits, so fail closed.
            Err(_) => return false,
        };

        let now = Instant::now();
        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, window| now.duration_since(window.started_at) < self.window);
        }

        let entry = windows
            .entry((client_id.to_owned(), action))
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }

        if entry.count >= action.hourly_limit() {
            tracing::debug!(
                client = client_id,
                action = action.name(),
                "rate limit exhausted"
            );
            return false;
        }
        entry.count += 1;
        true
    }
}

/// Limiter that never refuses; for tests and trusted internal callers.
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn try_consume(&self, _client_id: &str, _action: ImportAction) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleventh_url_import_in_window_is_refused() {
        let limiter = FixedWindowLimiter::hourly();
        for _ in 0..10 {
            assert!(limiter.try_consume("client-a", ImportAction::UrlImport));
        }
        assert!(!limiter.try_consume("client-a", ImportAction::UrlImport));
    }

    #[test]
    fn clients_have_independent_counters() {
        let limiter = FixedWindowLimiter::hourly();
        for _ in 0..10 {
            assert!(limiter.try_consume("client-a", ImportAction::UrlImport));
        }
        assert!(limiter.try_consume("client-b", ImportAction::UrlImport));
    }

    #[test]
    fn actions_have_independent_counters() {
        let limiter = FixedWindowLimiter::hourly();
        for _ in 0..10 {
            assert!(limiter.try_consume("client-a", ImportAction::FileImport));
        }
        assert!(limiter.try_consume("client-a", ImportAction::TextImport));
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let limiter = FixedWindowLimiter::with_window(Duration::from_millis(10));
        for _ in 0..10 {
            assert!(limiter.try_consume("client-a", ImportAction::UrlImport));
        }
        assert!(!limiter.try_consume("client-a", ImportAction::UrlImport));

        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.try_consume("client-a", ImportAction::UrlImport));
    }

    #[test]
    fn concurrent_clients_do_not_interfere() {
        let limiter = std::sync::Arc::new(FixedWindowLimiter::hourly());
        let handles: Vec<_> = (0..4)
            .map(|idx| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    let client = format!("client-{idx}");
                    (0..10)
                        .filter(|_| limiter.try_consume(&client, ImportAction::UrlImport))
                        .count()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 10);
        }
    }
}
