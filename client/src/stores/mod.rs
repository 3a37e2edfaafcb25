//! State containers with subscriber notification.
//!
//! Each store keeps its state in a `tokio::sync::watch` channel so any
//! number of views can observe changes. Request failures are returned to the
//! caller, recorded on the state and shown as an error toast.

mod auth_store;
mod listing_store;
mod notification_store;
mod profile_store;

use std::future::Future;

use tokio::sync::watch;
use tracing::warn;

use crate::api::ApiError;
use crate::domain::Toasts;

pub use auth_store::AuthStore;
pub use listing_store::{ListingState, ListingStore};
pub use notification_store::{NotificationState, NotificationStore};
pub use profile_store::{ProfileState, ProfileStore};

/// State that tracks an in-flight request and its last failure.
pub(crate) trait Loadable {
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, error: Option<String>);
}

impl Loadable for crate::domain::SessionState {
    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

/// Watch-backed state plus the toast queue failures are reported to.
pub(crate) struct StateCell<S> {
    state: watch::Sender<S>,
    toasts: Toasts,
}

impl<S: Loadable + Clone> StateCell<S> {
    pub(crate) fn new(initial: S, toasts: Toasts) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state, toasts }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    pub(crate) fn modify(&self, change: impl FnOnce(&mut S)) {
        self.state.send_modify(change);
    }

    pub(crate) fn replace(&self, value: S) {
        self.state.send_replace(value);
    }

    pub(crate) fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    /// Run `call` with the loading flag raised, then apply its result.
    ///
    /// On failure the error is stored, logged and toasted as
    /// `"{action}: {error}"`.
    pub(crate) async fn track<T, Fut>(
        &self,
        action: &'static str,
        call: Fut,
        apply: impl FnOnce(&mut S, &T),
    ) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.modify(|state| {
            state.set_loading(true);
            state.set_error(None);
        });
        let outcome = call.await;
        match &outcome {
            Ok(value) => self.modify(|state| {
                apply(state, value);
                state.set_loading(false);
            }),
            Err(error) => {
                warn!(action, error = %error, "store request failed");
                self.toasts.error(format!("{action}: {error}"));
                self.modify(|state| {
                    state.set_loading(false);
                    state.set_error(Some(error.to_string()));
                });
            }
        }
        outcome
    }
}
