//! # Rate limiting for model calls
//! Callers `acquire()` before each call; the limiter decides how long that waits.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait until the next call may proceed.
    async fn acquire(&self);
}

/// Enforces a minimum spacing between successive acquisitions. The first one is immediate.
#[derive(Debug)]
pub struct FixedSpacing {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedSpacing {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl RateLimiter for FixedSpacing {
    async fn acquire(&self) {
        // Holding the lock across the sleep serializes concurrent callers too.
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// No spacing at all. Tests and fixture runs only.
#[derive(Debug, Default)]
pub struct Unthrottled;

#[async_trait]
impl RateLimiter for Unthrottled {
    async fn acquire(&self) {}
}
