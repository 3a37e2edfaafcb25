//! API paths relative to the configured base URL.

use crate::domain::ListingId;

/// `POST` credentials, receive the session user and auth cookies.
pub const LOGIN: &str = "auth/login";
/// `POST` a registration form.
pub const REGISTER: &str = "auth/register";
/// `POST` to end the server-side session.
pub const LOGOUT: &str = "auth/logout";
/// `POST` to rotate the access token using the refresh cookie.
///
/// Exempt from refresh coordination: a 401 here ends the session.
pub const REFRESH: &str = "auth/refresh";
/// `GET`/`PUT` the profile, `POST` multipart to create it.
pub const PROFILE: &str = "auth/profile";
/// `GET` to browse, `POST` to create.
pub const LISTINGS: &str = "listings";
/// `GET` the signed-in user's own listings.
pub const MY_LISTINGS: &str = "listings/mine";
/// `GET` the notification list, `DELETE` to remove all.
pub const NOTIFICATIONS: &str = "notifications";
/// `PUT` to mark every notification read.
pub const NOTIFICATIONS_READ_ALL: &str = "notifications/read-all";
/// Default push hub path.
pub const NOTIFICATION_HUB: &str = "hubs/notifications";
/// Hub method invoked for each new notification.
pub const NOTIFICATION_EVENT: &str = "ReceiveNotification";

/// Path of a single listing.
pub fn listing(id: ListingId) -> String {
    format!("{LISTINGS}/{id}")
}
