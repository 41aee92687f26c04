//! Fixed-window admission limiting per client key.
//!
//! Each client key (normally the peer IP address) gets a counter and a reset
//! time. The first request after the reset time opens a new window; requests
//! beyond the quota inside a window are rejected until it elapses. A
//! background sweeper drops entries whose window is over, so the table only
//! holds recently active clients.

mod middleware;

pub use middleware::rate_limit;

use crate::config::RateLimitConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Quota metadata reported with every admission decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Window reset time, Unix seconds (rounded up)
    pub reset_at: u64,
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted(RateLimitInfo),
    Rejected {
        info: RateLimitInfo,
        /// Seconds until the window resets (rounded up)
        retry_after_secs: u64,
    },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }

    pub fn info(&self) -> &RateLimitInfo {
        match self {
            Self::Admitted(info) => info,
            Self::Rejected { info, .. } => info,
        }
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    /// Unix milliseconds after which the window is over
    reset_at_ms: u64,
}

/// Per-client fixed-window request limiter.
///
/// Thread-safe: the whole table sits behind one `Mutex`.
#[derive(Debug)]
pub struct AdmissionLimiter {
    windows: Mutex<HashMap<String, Window>>,
    window_ms: u64,
    max_requests: u32,
    rejected_count: AtomicU64,
}

impl AdmissionLimiter {
    /// Create a limiter admitting `max_requests` per `window` per key
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window_ms: window.as_millis() as u64,
            max_requests,
            rejected_count: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(Duration::from_millis(config.window_ms), config.max_requests)
    }

    /// Check and count one request for `key` at the current time
    pub fn check(&self, key: &str) -> Admission {
        self.check_at(key, now_millis())
    }

    /// Check and count one request for `key` at `now_ms` (Unix milliseconds)
    pub fn check_at(&self, key: &str, now_ms: u64) -> Admission {
        let mut windows = self.windows.lock();
        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at_ms: 0,
        });

        if now_ms > window.reset_at_ms {
            window.count = 1;
            window.reset_at_ms = now_ms + self.window_ms;
            return Admission::Admitted(self.info(window));
        }

        if window.count < self.max_requests {
            window.count += 1;
            return Admission::Admitted(self.info(window));
        }

        let info = self.info(window);
        let retry_after_secs = div_ceil(window.reset_at_ms - now_ms, 1000);
        drop(windows);

        self.rejected_count.fetch_add(1, Ordering::Relaxed);
        Admission::Rejected {
            info,
            retry_after_secs,
        }
    }

    /// Drop every entry whose window has elapsed; returns how many were removed
    pub fn sweep(&self) -> usize {
        self.sweep_at(now_millis())
    }

    /// Drop every entry whose window elapsed before `now_ms`
    pub fn sweep_at(&self, now_ms: u64) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, window| now_ms <= window.reset_at_ms);
        before - windows.len()
    }

    /// Number of client keys currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }

    /// Total rejected requests since startup
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    fn info(&self, window: &Window) -> RateLimitInfo {
        RateLimitInfo {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.count),
            reset_at: div_ceil(window.reset_at_ms, 1000),
        }
    }
}

/// Spawn a background task that periodically discards elapsed windows
pub fn spawn_sweeper(limiter: Arc<AdmissionLimiter>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(
                    removed,
                    remaining = limiter.tracked_clients(),
                    "Swept expired rate limit windows"
                );
            }
        }
    })
}

fn div_ceil(value: u64, divisor: u64) -> u64 {
    (value + divisor - 1) / divisor
}

/// Current time in Unix milliseconds
fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
