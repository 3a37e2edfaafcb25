//! Notification feed with bulk read and delete.
//!
//! Bulk actions are server round trips; the local feed only changes once
//! the server has accepted them.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::{Loadable, StateCell};
use crate::api::{ApiClient, ApiError, endpoints};
use crate::domain::ports::ApiRequest;
use crate::domain::{Notification, NotificationFeed, Toasts};
use crate::push::NotificationSink;

/// Observable notification state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationState {
    /// Notifications, newest first.
    pub feed: NotificationFeed,
    /// A notification request is in flight.
    pub is_loading: bool,
    /// Message from the last failed request.
    pub error: Option<String>,
}

impl Loadable for NotificationState {
    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

/// Accumulates notifications from the API and the push channel.
pub struct NotificationStore {
    api: Arc<ApiClient>,
    cell: StateCell<NotificationState>,
}

impl NotificationStore {
    /// Build an empty store.
    pub fn new(api: Arc<ApiClient>, toasts: Toasts) -> Self {
        Self {
            api,
            cell: StateCell::new(NotificationState::default(), toasts),
        }
    }

    /// Observe every change.
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.cell.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> NotificationState {
        self.cell.snapshot()
    }

    /// Replace the feed with the server's list.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `GET notifications`.
    pub async fn fetch(&self) -> Result<usize, ApiError> {
        let items = self
            .cell
            .track(
                "Could not load notifications",
                self.api.get_json(endpoints::NOTIFICATIONS),
                |state, items: &Vec<Notification>| {
                    state.feed = NotificationFeed::from_items(items.clone());
                },
            )
            .await?;
        Ok(items.len())
    }

    /// Prepend a pushed notification.
    pub fn receive(&self, notification: Notification) {
        debug!(message = %notification.message, "notification received");
        self.cell.modify(|state| state.feed.prepend(notification));
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `PUT notifications/read-all`; read flags are
    /// unchanged on failure.
    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.cell
            .track(
                "Could not mark notifications as read",
                self.api
                    .execute(ApiRequest::put(endpoints::NOTIFICATIONS_READ_ALL)),
                |state, _| state.feed.mark_all_read(),
            )
            .await
            .map(drop)
    }

    /// Delete every notification.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `DELETE notifications`; the feed is unchanged
    /// on failure.
    pub async fn delete_all(&self) -> Result<(), ApiError> {
        self.cell
            .track(
                "Could not delete notifications",
                self.api.delete(endpoints::NOTIFICATIONS),
                |state, _| state.feed.clear(),
            )
            .await
    }
}

impl NotificationSink for NotificationStore {
    fn deliver(&self, notification: Notification) {
        self.receive(notification);
    }
}
