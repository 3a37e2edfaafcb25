//! Notifications and the in-memory feed they accumulate in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One notification addressed to the signed-in user.
///
/// Push events carry no `id`; REST listings do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Server identifier, absent on push payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Message text.
    pub message: String,
    /// When the server created the notification.
    pub timestamp: DateTime<Utc>,
    /// Whether the user has read it.
    #[serde(default)]
    pub is_read: bool,
    /// Display name of the user who triggered it.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Picture URL of the user who triggered it.
    #[serde(default)]
    pub sender_picture: Option<String>,
}

/// Ordered notification list, newest first.
///
/// Only ever grows at the front; bulk operations touch every entry.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use skillswap_client::domain::{Notification, NotificationFeed};
///
/// let mut feed = NotificationFeed::default();
/// feed.prepend(Notification {
///     id: None,
///     message: "New match".to_owned(),
///     timestamp: Utc::now(),
///     is_read: false,
///     sender_name: None,
///     sender_picture: None,
/// });
/// assert_eq!(feed.unread_count(), 1);
/// feed.mark_all_read();
/// assert_eq!(feed.unread_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationFeed(Vec<Notification>);

impl NotificationFeed {
    /// Build a feed from a server listing, kept in server order.
    pub fn from_items(items: Vec<Notification>) -> Self {
        Self(items)
    }

    /// Insert a new notification at the front.
    pub fn prepend(&mut self, notification: Notification) {
        self.0.insert(0, notification);
    }

    /// Set every read flag, preserving order and count.
    pub fn mark_all_read(&mut self) {
        for notification in &mut self.0 {
            notification.is_read = true;
        }
    }

    /// Remove every notification.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.0.iter().filter(|n| !n.is_read).count()
    }

    /// Entries newest first.
    pub fn items(&self) -> &[Notification] {
        &self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the feed is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
