//! The signed-in user's profile.

use std::sync::Arc;

use tokio::sync::watch;

use super::{Loadable, StateCell};
use crate::api::{ApiClient, ApiError, endpoints};
use crate::domain::{Profile, ProfilePicture, ProfileUpdate, Toasts};

/// Observable profile state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileState {
    /// Last profile received from or accepted by the server.
    pub profile: Option<Profile>,
    /// A profile request is in flight.
    pub is_loading: bool,
    /// Message from the last failed request.
    pub error: Option<String>,
}

impl Loadable for ProfileState {
    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

/// Fetches and edits the signed-in user's profile.
pub struct ProfileStore {
    api: Arc<ApiClient>,
    cell: StateCell<ProfileState>,
}

impl ProfileStore {
    /// Build an empty store.
    pub fn new(api: Arc<ApiClient>, toasts: Toasts) -> Self {
        Self {
            api,
            cell: StateCell::new(ProfileState::default(), toasts),
        }
    }

    /// Observe every change.
    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.cell.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> ProfileState {
        self.cell.snapshot()
    }

    /// Load the profile.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `GET auth/profile`.
    pub async fn fetch(&self) -> Result<Profile, ApiError> {
        self.cell
            .track(
                "Could not load your profile",
                self.api.get_json(endpoints::PROFILE),
                |state, profile: &Profile| state.profile = Some(profile.clone()),
            )
            .await
    }

    /// Save profile edits.
    ///
    /// The picture already on file is kept.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from `PUT auth/profile`; local state is unchanged.
    pub async fn update(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        self.cell
            .track(
                "Could not save your profile",
                self.api.put(endpoints::PROFILE, update),
                |state, _| state.profile = Some(update.apply_to(state.profile.as_ref())),
            )
            .await?;
        self.cell.toasts().success("Profile saved");
        self.snapshot()
            .profile
            .ok_or_else(|| ApiError::decode("profile missing after update"))
    }

    /// Create the profile, optionally uploading a picture.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the multipart `POST auth/profile`.
    pub async fn create(
        &self,
        update: &ProfileUpdate,
        picture: Option<&ProfilePicture>,
    ) -> Result<Profile, ApiError> {
        let profile = self
            .cell
            .track(
                "Could not create your profile",
                self.api
                    .post_multipart(endpoints::PROFILE, update.to_form_parts(picture)),
                |state, profile: &Profile| state.profile = Some(profile.clone()),
            )
            .await?;
        self.cell.toasts().success("Profile created");
        Ok(profile)
    }
}
