//! Sign in and stream SkillSwap notifications to the log until interrupted.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;

use clap::Parser;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

use skillswap_client::domain::{LoginCredentials, NotificationFeed};
use skillswap_client::{ClientSettings, SkillSwapClient};

const PASSWORD_ENV: &str = "SKILLSWAP_PASSWORD";

/// `skillswap-watch` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "skillswap-watch",
    about = "Sign in to SkillSwap and log notifications as they arrive",
    version
)]
struct CliArgs {
    /// Account email. The password is read from `SKILLSWAP_PASSWORD`.
    #[arg(long, value_name = "email")]
    email: String,
    /// Mark every notification read after the initial fetch.
    #[arg(long = "mark-read")]
    mark_read: bool,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = ClientSettings::load_from_iter([OsString::from("skillswap-watch")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let password = Zeroizing::new(
        std::env::var(PASSWORD_ENV)
            .map_err(|_| io::Error::other(format!("{PASSWORD_ENV} must be set")))?,
    );
    let credentials =
        LoginCredentials::try_from_parts(&args.email, &password).map_err(io::Error::other)?;

    let client = SkillSwapClient::connect(&settings).map_err(io::Error::other)?;
    let user = client
        .auth()
        .login(&credentials)
        .await
        .map_err(|error| io::Error::other(format!("login: {error}")))?;
    info!(user = %user.display_name(), "signed in");

    let count = client
        .notifications()
        .fetch()
        .await
        .map_err(|error| io::Error::other(format!("fetch notifications: {error}")))?;
    let unread = client.notifications().snapshot().feed.unread_count();
    info!(count, unread, "notifications loaded");
    if args.mark_read && unread > 0 {
        client
            .notifications()
            .mark_all_read()
            .await
            .map_err(|error| io::Error::other(format!("mark read: {error}")))?;
        info!("notifications marked read");
    }

    let channel = client.start_notifications();
    let mut states = channel.state();
    let mut feed = client.notifications().subscribe();
    let mut seen = feed.borrow().feed.len();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                info!(?state, "push channel state");
            }
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = feed.borrow_and_update().feed.clone();
                log_new(&current, seen);
                seen = current.len();
            }
        }
    }

    channel.shutdown().await;
    client.auth().logout().await;
    info!("signed out");
    Ok(())
}

fn log_new(feed: &NotificationFeed, seen: usize) {
    let fresh = feed.len().saturating_sub(seen);
    for notification in feed.items().iter().take(fresh) {
        info!(
            sender = notification.sender_name.as_deref().unwrap_or("SkillSwap"),
            message = %notification.message,
            "notification"
        );
    }
}
