//! Reconnection schedule for the push channel.
//!
//! Exponential backoff capped at a maximum interval, bounded by a total time
//! budget measured from the moment the connection was lost. Once the next
//! wait would overrun the budget, automatic reconnection stops.

use std::time::Duration;

/// Default first reconnect delay.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
/// Default cap on a single reconnect delay.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(30);
/// Default total time spent reconnecting before giving up.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(300);

/// Backoff schedule for push reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    initial: Duration,
    max_interval: Duration,
    budget: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_DELAY, DEFAULT_MAX_INTERVAL, DEFAULT_BUDGET)
    }
}

impl ReconnectPolicy {
    /// Build a policy. A zero `initial` is raised to one millisecond and
    /// `max_interval` is never below `initial`.
    pub fn new(initial: Duration, max_interval: Duration, budget: Duration) -> Self {
        let initial = initial.max(Duration::from_millis(1));
        Self {
            initial,
            max_interval: max_interval.max(initial),
            budget,
        }
    }

    /// First reconnect delay.
    pub fn initial(&self) -> Duration {
        self.initial
    }

    /// Cap on a single reconnect delay.
    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Total reconnect budget.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Delay before reconnect `attempt` (1-based), or `None` to give up.
    ///
    /// `elapsed` is the time already spent since the connection was lost.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use skillswap_client::domain::ReconnectPolicy;
    ///
    /// let policy = ReconnectPolicy::new(
    ///     Duration::from_secs(1),
    ///     Duration::from_secs(4),
    ///     Duration::from_secs(10),
    /// );
    /// assert_eq!(policy.delay_for(1, Duration::ZERO), Some(Duration::from_secs(1)));
    /// assert_eq!(policy.delay_for(4, Duration::ZERO), Some(Duration::from_secs(4)));
    /// assert_eq!(policy.delay_for(2, Duration::from_secs(9)), None);
    /// ```
    pub fn delay_for(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        let delay = self.base_delay(attempt);
        let deadline = elapsed.checked_add(delay)?;
        (deadline <= self.budget).then_some(delay)
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_interval.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}
