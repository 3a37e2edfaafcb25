//! Transient, auto-dismissing user messages.
//!
//! Request failures that are not field validation errors are surfaced here.
//! Toasts expire after a fixed time-to-live; expired entries are pruned on
//! every push and read.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::debug;

/// Default time a toast stays visible.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(3);

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
    /// Neutral information.
    Info,
}

/// One visible toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Queue-unique identifier.
    pub id: u64,
    /// Severity.
    pub level: ToastLevel,
    /// Text shown to the user.
    pub message: String,
    /// Instant after which the toast is dismissed.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ToastState {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastState {
    fn prune(&mut self, now: DateTime<Utc>) {
        self.toasts.retain(|toast| toast.expires_at > now);
    }
}

/// Shared toast queue.
#[derive(Clone)]
pub struct Toasts {
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    state: Arc<Mutex<ToastState>>,
}

impl Toasts {
    /// Build a queue whose toasts live for `ttl`.
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Self {
            clock,
            ttl,
            state: Arc::new(Mutex::new(ToastState::default())),
        }
    }

    /// Show a toast and return its identifier.
    pub fn push(&self, level: ToastLevel, message: impl Into<String>) -> u64 {
        let message = message.into();
        let now = self.clock.utc();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut state = self.lock();
        state.prune(now);
        state.next_id = state.next_id.wrapping_add(1);
        let id = state.next_id;
        debug!(id, ?level, message = %message, "toast shown");
        state.toasts.push(Toast {
            id,
            level,
            message,
            expires_at,
        });
        id
    }

    /// Shorthand for an error toast.
    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(ToastLevel::Error, message)
    }

    /// Shorthand for a success toast.
    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(ToastLevel::Success, message)
    }

    /// Unexpired toasts, oldest first. Expired ones are dropped.
    pub fn active(&self) -> Vec<Toast> {
        let now = self.clock.utc();
        let mut state = self.lock();
        state.prune(now);
        state.toasts.clone()
    }

    /// Dismiss a toast early. Returns whether it was still queued.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.lock();
        let before = state.toasts.len();
        state.toasts.retain(|toast| toast.id != id);
        state.toasts.len() != before
    }

    fn lock(&self) -> MutexGuard<'_, ToastState> {
        // A panic while holding the lock cannot leave the queue inconsistent.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
