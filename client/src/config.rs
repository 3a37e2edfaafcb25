//! Client configuration loaded via OrthoConfig.
//!
//! Endpoint fields are optional and fall back to a locally running backend.
//! Timing fields always carry a value so an empty load still succeeds.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::api::endpoints::NOTIFICATION_HUB;
use crate::domain::ReconnectPolicy;

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/";
const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1_000;
const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;
const DEFAULT_RECONNECT_BUDGET_SECS: u64 = 300;
const DEFAULT_TOAST_TTL_MS: u64 = 3_000;

/// Errors raised while interpreting [`ClientSettings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The base URL could not be parsed.
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        /// Configured value.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The base URL is not `http` or `https`.
    #[error("unsupported URL scheme `{scheme}`; expected http or https")]
    UnsupportedScheme {
        /// Scheme found in the configured URL.
        scheme: String,
    },
    /// The hub path could not be joined onto the base URL.
    #[error("invalid hub path `{path}`: {source}")]
    InvalidHubPath {
        /// Configured value.
        path: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
}

/// Settings for the SkillSwap client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SKILLSWAP")]
pub struct ClientSettings {
    /// API base URL, for example `https://skillswap.example/api/`.
    pub base_url: Option<String>,
    /// Notification hub path relative to the base URL.
    pub hub_path: Option<String>,
    /// Per-request timeout in seconds. Unset leaves reqwest's default.
    pub request_timeout_secs: Option<u64>,
    /// First push reconnect delay in milliseconds.
    #[ortho_config(default = 1_000)]
    pub reconnect_initial_ms: u64,
    /// Cap on a single push reconnect delay in milliseconds.
    #[ortho_config(default = 30_000)]
    pub reconnect_max_ms: u64,
    /// Total push reconnect budget in seconds.
    #[ortho_config(default = 300)]
    pub reconnect_budget_secs: u64,
    /// How long toasts stay visible, in milliseconds.
    #[ortho_config(default = 3_000)]
    pub toast_ttl_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            hub_path: None,
            request_timeout_secs: None,
            reconnect_initial_ms: DEFAULT_RECONNECT_INITIAL_MS,
            reconnect_max_ms: DEFAULT_RECONNECT_MAX_MS,
            reconnect_budget_secs: DEFAULT_RECONNECT_BUDGET_SECS,
            toast_ttl_ms: DEFAULT_TOAST_TTL_MS,
        }
    }
}

impl ClientSettings {
    /// API base URL, always ending in `/` so relative joins keep the prefix.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidBaseUrl`] or [`ConfigError::UnsupportedScheme`].
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL).trim();
        let with_slash = if raw.ends_with('/') {
            raw.to_owned()
        } else {
            format!("{raw}/")
        };
        let url = Url::parse(&with_slash).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw.to_owned(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme {
                scheme: other.to_owned(),
            }),
        }
    }

    /// Websocket URL of the notification hub.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from [`ClientSettings::base_url`], or
    /// [`ConfigError::InvalidHubPath`].
    pub fn hub_url(&self) -> Result<Url, ConfigError> {
        let path = self
            .hub_path
            .as_deref()
            .unwrap_or(NOTIFICATION_HUB)
            .trim_start_matches('/');
        let mut url = self
            .base_url()?
            .join(path)
            .map_err(|source| ConfigError::InvalidHubPath {
                path: path.to_owned(),
                source,
            })?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::UnsupportedScheme {
                scheme: url.scheme().to_owned(),
            })?;
        Ok(url)
    }

    /// Per-request timeout, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Push reconnection schedule.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_initial_ms),
            Duration::from_millis(self.reconnect_max_ms),
            Duration::from_secs(self.reconnect_budget_secs),
        )
    }

    /// Toast time-to-live.
    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }
}
