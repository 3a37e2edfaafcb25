//! SkillSwap client library.
//!
//! Session, profile, listing and notification stores over an authenticated
//! HTTP client that serialises token refreshes, plus a reconnecting push
//! channel for real-time notifications.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod push;
pub mod stores;

pub use app::SkillSwapClient;
pub use config::ClientSettings;

#[cfg(test)]
pub(crate) mod test_support;
