//! Session state and the login, registration and refresh actions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use super::StateCell;
use crate::api::{ApiClient, ApiError, SessionHooks, endpoints};
use crate::domain::ports::ApiRequest;
use crate::domain::{LoginCredentials, Registration, SessionState, SessionUser, Toasts};

/// Holds the authentication state and supplies the refresh callbacks used
/// by [`ApiClient`].
pub struct AuthStore {
    api: Arc<ApiClient>,
    cell: StateCell<SessionState>,
    authenticated: watch::Sender<bool>,
}

impl AuthStore {
    /// Build a signed-out store and register it as the client's session
    /// hooks.
    pub fn new(api: Arc<ApiClient>, toasts: Toasts) -> Arc<Self> {
        let (authenticated, _) = watch::channel(false);
        let store = Arc::new(Self {
            api,
            cell: StateCell::new(SessionState::default(), toasts),
            authenticated,
        });
        store.api.register_session_hooks(&store);
        store
    }

    /// Observe every session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.cell.subscribe()
    }

    /// Current session.
    pub fn snapshot(&self) -> SessionState {
        self.cell.snapshot()
    }

    /// Derived signed-in flag. Only changes on real transitions.
    pub fn authenticated(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `auth/login`; the session stays signed out.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<SessionUser, ApiError> {
        let payload = credentials.to_payload();
        let user = self
            .cell
            .track(
                "Sign-in failed",
                self.api.post_json(endpoints::LOGIN, &payload),
                |state, user: &SessionUser| *state = SessionState::authenticated(user.clone()),
            )
            .await;
        self.publish_flag();
        let user = user?;
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `auth/register`.
    pub async fn register(&self, registration: &Registration) -> Result<SessionUser, ApiError> {
        let payload = registration.to_payload();
        let user = self
            .cell
            .track(
                "Registration failed",
                self.api.post_json(endpoints::REGISTER, &payload),
                |state, user: &SessionUser| *state = SessionState::authenticated(user.clone()),
            )
            .await;
        self.publish_flag();
        let user = user?;
        info!(user_id = %user.id, "registered");
        Ok(user)
    }

    /// Sign out. The local session is cleared even if the server call fails.
    pub async fn logout(&self) {
        if let Err(error) = self.api.execute(ApiRequest::post(endpoints::LOGOUT)).await {
            warn!(error = %error, "server-side logout failed; clearing local session");
        }
        self.clear();
        info!("signed out");
    }

    /// Rotate the access token using the refresh cookie.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `auth/refresh`, including
    /// [`ApiError::Unauthorized`] when the refresh cookie is gone.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.api
            .execute(ApiRequest::post(endpoints::REFRESH))
            .await
            .map(drop)
    }

    /// Detect an existing cookie session on start-up.
    ///
    /// Returns whether a session was found.
    ///
    /// # Errors
    ///
    /// Failures other than missing or expired credentials.
    pub async fn restore(&self) -> Result<bool, ApiError> {
        match self.api.get_json::<SessionUser>(endpoints::PROFILE).await {
            Ok(user) => {
                info!(user_id = %user.id, "restored session");
                self.cell.replace(SessionState::authenticated(user));
                self.publish_flag();
                Ok(true)
            }
            Err(error) if error.requires_login() => {
                self.clear();
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    /// End the local session without a network call.
    pub fn expire(&self) {
        if self.snapshot().is_authenticated {
            self.cell.toasts().error("Your session has expired. Please sign in again.");
        }
        self.clear();
    }

    fn clear(&self) {
        self.cell.replace(SessionState::default());
        self.publish_flag();
    }

    fn publish_flag(&self) {
        let signed_in = self.snapshot().is_authenticated;
        self.authenticated.send_if_modified(|current| {
            let changed = *current != signed_in;
            *current = signed_in;
            changed
        });
    }
}

#[async_trait]
impl SessionHooks for AuthStore {
    async fn refresh_session(&self) -> Result<(), ApiError> {
        self.refresh().await
    }

    fn session_expired(&self) {
        warn!("session expired");
        self.expire();
    }
}
