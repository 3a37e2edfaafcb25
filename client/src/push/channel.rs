//! Supervisor task that keeps one push connection open while signed in.
//!
//! The task follows the session flag: it connects when the flag turns true,
//! drops the connection as soon as it turns false and reconnects on the next
//! sign-in. A lost connection is retried on the [`ReconnectPolicy`]
//! schedule; once the budget is spent the task parks in
//! [`ChannelState::GaveUp`] until the flag changes again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use mockable::{Clock, DefaultClock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::ports::{PushConnector, PushEvent, PushStream, Sleeper, TokioSleeper};
use crate::domain::{Notification, ReconnectPolicy};

/// Receives notifications pushed by the server.
pub trait NotificationSink: Send + Sync {
    /// Accept one notification.
    fn deliver(&self, notification: Notification);
}

/// Lifecycle of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Signed out; no connection.
    Idle,
    /// Opening the first connection of a session.
    Connecting,
    /// Receiving events.
    Connected,
    /// Waiting before reconnect `attempt` (1-based).
    Reconnecting {
        /// Reconnect attempt about to be made.
        attempt: u32,
    },
    /// The reconnect budget ran out; waiting for the next sign-in.
    GaveUp,
}

/// Configuration for the push supervisor.
pub struct NotificationChannel {
    connector: Arc<dyn PushConnector>,
    sink: Arc<dyn NotificationSink>,
    policy: ReconnectPolicy,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl NotificationChannel {
    /// Channel with the default reconnect policy, tokio sleeps and the
    /// system clock.
    pub fn new(connector: Arc<dyn PushConnector>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            connector,
            sink,
            policy: ReconnectPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(DefaultClock),
        }
    }

    /// Override the reconnect schedule.
    #[must_use]
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override how backoff delays are slept.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Override the clock used to measure the reconnect budget.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start the supervisor, following `authenticated`.
    pub fn spawn(self, authenticated: watch::Receiver<bool>) -> ChannelHandle {
        let (state, state_rx) = watch::channel(ChannelState::Idle);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = Worker {
            channel: self,
            auth: authenticated,
            shutdown: shutdown_rx,
            state,
        };
        ChannelHandle {
            shutdown,
            state: state_rx,
            task: tokio::spawn(worker.run()),
        }
    }
}

/// Owner of a running supervisor. Dropping it stops the task.
pub struct ChannelHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<ChannelState>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    /// Observe state changes.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Current state.
    pub fn current(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Stop the supervisor and close any open connection.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        if let Err(error) = self.task.await {
            warn!(error = %error, "push supervisor ended abnormally");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    SignedOut,
    Shutdown,
}

struct Worker {
    channel: NotificationChannel,
    auth: watch::Receiver<bool>,
    shutdown: watch::Receiver<bool>,
    state: watch::Sender<ChannelState>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            self.publish(ChannelState::Idle);
            let signed_in = tokio::select! {
                biased;
                _ = self.shutdown.wait_for(|stop| *stop) => false,
                ready = self.auth.wait_for(|signed_in| *signed_in) => ready.is_ok(),
            };
            // A dropped session flag can still read `true`; stop rather than
            // reconnect for a session nobody can end.
            if signed_in && self.auth.has_changed().is_err() {
                info!("session flag dropped; push supervisor stopping");
                break;
            }
            if !signed_in {
                break;
            }
            if self.session().await == Exit::Shutdown {
                break;
            }
            info!("signed out; push connection closed");
        }
        self.publish(ChannelState::Idle);
        debug!("push supervisor stopped");
    }

    /// Connect and reconnect until sign-out, shutdown or budget exhaustion.
    async fn session(&mut self) -> Exit {
        let mut attempt: u32 = 0;
        let mut lost_at: Option<DateTime<Utc>> = None;
        loop {
            if attempt == 0 {
                self.publish(ChannelState::Connecting);
            }
            let connected = tokio::select! {
                biased;
                exit = interrupted(&mut self.shutdown, &mut self.auth) => return exit,
                connected = self.channel.connector.connect() => connected,
            };
            match connected {
                Ok(stream) => {
                    info!(attempt, "push connection established");
                    attempt = 0;
                    lost_at = None;
                    self.publish(ChannelState::Connected);
                    if let Some(exit) = self.pump(stream).await {
                        return exit;
                    }
                }
                Err(error) => warn!(attempt, error = %error, "push connection attempt failed"),
            }

            let now = self.channel.clock.utc();
            let lost = *lost_at.get_or_insert(now);
            let elapsed = (now - lost).to_std().unwrap_or_default();
            attempt = attempt.saturating_add(1);
            let Some(delay) = self.channel.policy.delay_for(attempt, elapsed) else {
                warn!(
                    attempt,
                    elapsed_ms = elapsed.as_millis(),
                    "push reconnect budget exhausted; giving up until next sign-in"
                );
                self.publish(ChannelState::GaveUp);
                return interrupted(&mut self.shutdown, &mut self.auth).await;
            };
            debug!(attempt, delay_ms = delay.as_millis(), "scheduling push reconnect");
            self.publish(ChannelState::Reconnecting { attempt });
            tokio::select! {
                biased;
                exit = interrupted(&mut self.shutdown, &mut self.auth) => return exit,
                () = self.channel.sleeper.sleep(delay) => {}
            }
        }
    }

    /// Forward events until the connection ends (`None`) or the session is
    /// interrupted. The stream is dropped, closing the socket, on return.
    async fn pump(&mut self, mut stream: PushStream) -> Option<Exit> {
        loop {
            tokio::select! {
                biased;
                exit = interrupted(&mut self.shutdown, &mut self.auth) => return Some(exit),
                event = stream.next() => match event {
                    Some(Ok(PushEvent::Notification(notification))) => {
                        self.channel.sink.deliver(notification);
                    }
                    Some(Err(error)) => {
                        warn!(error = %error, "push connection lost");
                        return None;
                    }
                    None => {
                        info!("push connection closed by the server");
                        return None;
                    }
                },
            }
        }
    }

    fn publish(&self, next: ChannelState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Resolves once the handle asks for shutdown or the user signs out.
///
/// A dropped handle or a dropped session flag counts as shutdown.
async fn interrupted(
    shutdown: &mut watch::Receiver<bool>,
    auth: &mut watch::Receiver<bool>,
) -> Exit {
    tokio::select! {
        biased;
        _ = shutdown.wait_for(|stop| *stop) => Exit::Shutdown,
        signed_out = auth.wait_for(|signed_in| !*signed_in) => match signed_out {
            Ok(_) => Exit::SignedOut,
            Err(_) => Exit::Shutdown,
        },
    }
}
