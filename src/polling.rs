//! Waiting and bounding rules for the status poll loop.

use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Pause between two status queries.
///
/// `attempt` is the number of queries issued so far (starting at 1).
#[async_trait]
pub trait Wait: Send + Sync {
    async fn wait(&self, attempt: u32);
}

/// Sleeps for the same duration after every query.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedInterval {
    pub interval: Duration,
}

impl FixedInterval {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

#[async_trait]
impl Wait for FixedInterval {
    async fn wait(&self, _attempt: u32) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Does not wait at all.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Immediate;

#[async_trait]
impl Wait for Immediate {
    async fn wait(&self, _attempt: u32) {}
}

/// Bounds on the poll loop. Everything is unbounded unless set.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Builder, Eq, PartialEq)]
pub struct PollPolicy {
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub interval: Duration,
    /// Stop after this many status queries.
    pub max_attempts: Option<u32>,
    /// Stop once this much time has passed since the first query.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PollPolicy {
    /// Wait strategy matching `interval`.
    #[must_use]
    pub const fn wait(&self) -> FixedInterval {
        FixedInterval::new(self.interval)
    }

    pub(crate) fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    pub(crate) fn timed_out(&self, elapsed: Duration) -> bool {
        self.timeout.is_some_and(|timeout| elapsed >= timeout)
    }
}
