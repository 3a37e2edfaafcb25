//! Session state held by the auth store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the signed-in user as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Stable user identifier.
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
}

impl SessionUser {
    /// `first last`, falling back to the email when both names are blank.
    pub fn display_name(&self) -> String {
        let joined = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = joined.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }
}

/// Authentication state.
///
/// ## Lifecycle
/// Created authenticated on login or registration success; reset to
/// [`SessionState::default`] on logout or a failed token refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Whether the backend accepted the current credentials.
    pub is_authenticated: bool,
    /// Signed-in user, present only while authenticated.
    pub user: Option<SessionUser>,
    /// An auth request is in flight.
    pub is_loading: bool,
    /// Message from the last failed auth request.
    pub error: Option<String>,
}

impl SessionState {
    /// Authenticated state for `user`.
    pub fn authenticated(user: SessionUser) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            is_loading: false,
            error: None,
        }
    }

    /// Signed-out state carrying an error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}
