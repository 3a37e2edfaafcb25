//! Composition root wiring the transport, stores and push channel.
//!
//! One cookie jar is shared by the HTTP transport and the hub connector so
//! the session cookies issued at login also authenticate the push
//! connection.

use std::sync::Arc;

use mockable::DefaultClock;
use reqwest::cookie::Jar;
use tracing::info;

use crate::api::ApiClient;
use crate::config::{ClientSettings, ConfigError};
use crate::domain::Toasts;
use crate::outbound::http::ReqwestTransport;
use crate::outbound::hub::HubConnector;
use crate::push::{ChannelHandle, NotificationChannel};
use crate::stores::{AuthStore, ListingStore, NotificationStore, ProfileStore};

/// Errors raised while assembling a [`SkillSwapClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The settings do not describe a usable endpoint.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fully wired client: one API client, the stores and the push connector.
pub struct SkillSwapClient {
    auth: Arc<AuthStore>,
    profile: ProfileStore,
    listings: ListingStore,
    notifications: Arc<NotificationStore>,
    toasts: Toasts,
    connector: Arc<HubConnector>,
    settings: ClientSettings,
}

impl SkillSwapClient {
    /// Build every component from `settings`. No request is sent.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] for an unusable base URL or hub path,
    /// [`ClientError::Http`] when reqwest cannot build its client.
    pub fn connect(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = settings.base_url()?;
        let hub_url = settings.hub_url()?;
        let cookies = Arc::new(Jar::default());
        let transport = ReqwestTransport::new(
            base_url.clone(),
            Arc::clone(&cookies),
            settings.request_timeout(),
        )?;
        let api = Arc::new(ApiClient::new(Arc::new(transport)));
        let toasts = Toasts::new(Arc::new(DefaultClock), settings.toast_ttl());
        info!(%base_url, %hub_url, "SkillSwap client configured");

        Ok(Self {
            auth: AuthStore::new(Arc::clone(&api), toasts.clone()),
            profile: ProfileStore::new(Arc::clone(&api), toasts.clone()),
            listings: ListingStore::new(Arc::clone(&api), toasts.clone()),
            notifications: Arc::new(NotificationStore::new(api, toasts.clone())),
            toasts,
            connector: Arc::new(HubConnector::new(hub_url, base_url, cookies)),
            settings: settings.clone(),
        })
    }

    /// Session store.
    pub fn auth(&self) -> &Arc<AuthStore> {
        &self.auth
    }

    /// Profile store.
    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    /// Listing store.
    pub fn listings(&self) -> &ListingStore {
        &self.listings
    }

    /// Notification store; also the push channel's sink.
    pub fn notifications(&self) -> &Arc<NotificationStore> {
        &self.notifications
    }

    /// Shared toast queue.
    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    /// Start the push channel. It follows the session flag, so it may be
    /// started before login.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_notifications(&self) -> ChannelHandle {
        let connector = Arc::clone(&self.connector);
        let sink = Arc::clone(&self.notifications);
        NotificationChannel::new(connector, sink)
            .with_policy(self.settings.reconnect_policy())
            .spawn(self.auth.authenticated())
    }
}

#[cfg(test)]
mod tests {
    //! Wiring coverage; nothing here touches the network.
    use super::*;
    use crate::push::ChannelState;

    fn settings(base_url: &str) -> ClientSettings {
        ClientSettings {
            base_url: Some(base_url.to_owned()),
            ..ClientSettings::default()
        }
    }

    #[test]
    fn rejects_unusable_base_urls() {
        let error = SkillSwapClient::connect(&settings("ftp://files.skillswap.test/"))
            .err()
            .expect("ftp is rejected");
        assert!(matches!(
            error,
            ClientError::Config(ConfigError::UnsupportedScheme { .. })
        ));
    }

    #[tokio::test]
    async fn starts_signed_out_with_an_idle_channel() {
        let client = SkillSwapClient::connect(&settings("http://127.0.0.1:9/api"))
            .expect("client builds");

        assert!(!*client.auth().authenticated().borrow());
        assert!(client.notifications().snapshot().feed.is_empty());
        assert!(client.toasts().active().is_empty());

        let handle = client.start_notifications();
        tokio::task::yield_now().await;
        assert_eq!(handle.current(), ChannelState::Idle);
        handle.shutdown().await;
    }
}
