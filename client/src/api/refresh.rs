//! Single-flight token refresh.
//!
//! The first caller to hit an expired session becomes the leader and runs the
//! refresh; everyone arriving while it is in flight parks a `oneshot`
//! receiver in a FIFO queue. When the leader settles, every parked caller is
//! released in arrival order with the same outcome. The flag and the queue
//! are guarded by one short-lived std mutex that is never held across an
//! await point.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::debug;

use super::ApiError;

/// Outcome shared with every caller of one refresh cycle.
pub(crate) type RefreshOutcome = Result<(), ApiError>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Role handed to a caller that needs a fresh session.
enum Ticket {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
}

/// Serialises concurrent refresh requests behind one in-flight refresh.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Wait for a refresh outcome, running `refresh` only if no refresh is
    /// currently in flight.
    ///
    /// `on_failure` runs once per failed cycle, after every queued caller
    /// has been released, and only in the leader.
    pub(crate) async fn refresh_or_wait<F, Fut, L>(
        &self,
        refresh: F,
        on_failure: L,
    ) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
        L: FnOnce(),
    {
        match self.join() {
            Ticket::Follower(receiver) => receiver.await.unwrap_or_else(|_| {
                Err(ApiError::session_expired("token refresh was abandoned"))
            }),
            Ticket::Leader => {
                let mut guard = LeaderGuard {
                    coordinator: self,
                    settled: false,
                };
                let outcome = refresh().await;
                let released = guard.settle(&outcome);
                debug!(released, success = outcome.is_ok(), "token refresh settled");
                if outcome.is_err() {
                    on_failure();
                }
                outcome
            }
        }
    }

    /// Number of callers parked behind the in-flight refresh.
    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Whether a refresh is currently running.
    #[cfg(test)]
    pub(crate) fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    fn join(&self) -> Ticket {
        let mut state = self.lock();
        if state.in_flight {
            let (sender, receiver) = oneshot::channel();
            state.waiters.push_back(sender);
            Ticket::Follower(receiver)
        } else {
            state.in_flight = true;
            Ticket::Leader
        }
    }

    fn release(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        let released = waiters.len();
        for waiter in waiters {
            // A dropped receiver means that caller was cancelled.
            let _ = waiter.send(outcome.clone());
        }
        released
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        // The state is two plain fields updated atomically under the lock, so
        // a poisoned guard still holds a consistent value.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Releases followers even if the leader's future is dropped mid-refresh.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl LeaderGuard<'_> {
    fn settle(&mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        self.coordinator.release(outcome)
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.release(&Err(ApiError::session_expired(
                "token refresh was cancelled",
            )));
        }
    }
}
