//! Websocket connector for the SignalR notification hub.
//!
//! Credentials ride on the upgrade request as a `Cookie` header taken from
//! the same jar the HTTP transport uses. After the handshake the socket is
//! wrapped in a [`PushStream`] that pings the hub on a fixed interval and
//! yields one event per `ReceiveNotification` invocation.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt, stream};
use reqwest::cookie::{CookieStore, Jar};
use tokio::net::TcpStream;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};
use url::Url;

use super::protocol::{HubDecoder, Inbound, handshake_request, ping_message};
use crate::domain::ports::{PushConnector, PushError, PushEvent, PushStream};

/// Interval between client keep-alive pings.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens hub connections authenticated with the shared cookie jar.
pub struct HubConnector {
    hub_url: Url,
    cookie_url: Url,
    cookies: Arc<Jar>,
    ping_interval: Duration,
    handshake_timeout: Duration,
}

impl HubConnector {
    /// Connector for `hub_url` (`ws`/`wss`), sending the cookies the jar
    /// holds for `cookie_url` (the API base URL).
    pub fn new(hub_url: Url, cookie_url: Url, cookies: Arc<Jar>) -> Self {
        Self {
            hub_url,
            cookie_url,
            cookies,
            ping_interval: DEFAULT_PING_INTERVAL,
            handshake_timeout: CONNECT_TIMEOUT,
        }
    }

    /// Override the keep-alive interval.
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Override how long to wait for the hub's handshake reply.
    #[must_use]
    pub fn with_handshake_timeout(mut self, limit: Duration) -> Self {
        self.handshake_timeout = limit;
        self
    }

    async fn open(&self) -> Result<Socket, PushError> {
        let mut request = self
            .hub_url
            .as_str()
            .into_client_request()
            .map_err(|error| PushError::connect(format!("invalid hub URL: {error}")))?;
        if let Some(cookie) = self.cookies.cookies(&self.cookie_url) {
            request.headers_mut().insert(COOKIE, cookie);
        }
        let (socket, _) = timeout(CONNECT_TIMEOUT, connect_async(request))
            .await
            .map_err(|_| PushError::connect("timed out opening hub connection"))?
            .map_err(|error| PushError::connect(error.to_string()))?;
        Ok(socket)
    }
}

#[async_trait]
impl PushConnector for HubConnector {
    async fn connect(&self) -> Result<PushStream, PushError> {
        let mut socket = self.open().await?;
        let (decoder, pending) = timeout(self.handshake_timeout, handshake(&mut socket))
            .await
            .map_err(|_| PushError::handshake("timed out waiting for handshake reply"))??;
        info!(hub = %self.hub_url, "hub handshake complete");

        let mut ping = interval_at(Instant::now() + self.ping_interval, self.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(hub_stream(HubSession {
            socket,
            decoder,
            pending,
            ping,
            finished: false,
        }))
    }
}

/// Send the handshake and read until the hub acknowledges it. Messages that
/// arrive in the same frame as the reply are kept for the stream.
async fn handshake(socket: &mut Socket) -> Result<(HubDecoder, VecDeque<Inbound>), PushError> {
    socket
        .send(Message::Text(handshake_request().into()))
        .await
        .map_err(|error| PushError::handshake(error.to_string()))?;

    let mut decoder = HubDecoder::default();
    let mut pending = VecDeque::new();
    while !decoder.is_handshaken() {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => pending.extend(decoder.decode(&text)?),
            Some(Ok(Message::Close(_))) | None => {
                return Err(PushError::handshake("hub closed during handshake"));
            }
            Some(Ok(_)) => {}
            Some(Err(error)) => return Err(PushError::handshake(error.to_string())),
        }
    }
    Ok((decoder, pending))
}

struct HubSession {
    socket: Socket,
    decoder: HubDecoder,
    pending: VecDeque<Inbound>,
    ping: Interval,
    finished: bool,
}

type Step = Option<(Result<PushEvent, PushError>, HubSession)>;

impl HubSession {
    /// Drain decoded messages, returning the next item to yield if any.
    fn drain(&mut self) -> Option<Result<PushEvent, PushError>> {
        while let Some(inbound) = self.pending.pop_front() {
            match inbound {
                Inbound::Notification(notification) => {
                    return Some(Ok(PushEvent::Notification(notification)));
                }
                Inbound::Close(error) => {
                    self.finished = true;
                    debug!(?error, "hub sent close");
                    return error.map(|message| Err(PushError::closed(message)));
                }
                Inbound::Ping | Inbound::Ignored => {}
            }
        }
        None
    }

    fn fail(mut self, error: PushError) -> Step {
        self.finished = true;
        Some((Err(error), self))
    }
}

fn hub_stream(session: HubSession) -> PushStream {
    stream::unfold(session, |mut session| async move {
        loop {
            if let Some(item) = session.drain() {
                return Some((item, session));
            }
            if session.finished {
                return None;
            }
            tokio::select! {
                _ = session.ping.tick() => {
                    if let Err(error) = session.socket.send(Message::Text(ping_message().into())).await {
                        return session.fail(PushError::closed(error.to_string()));
                    }
                }
                frame = session.socket.next() => match frame {
                    Some(Ok(Message::Text(text))) => match session.decoder.decode(&text) {
                        Ok(messages) => session.pending.extend(messages),
                        Err(error) => return session.fail(error),
                    },
                    Some(Ok(Message::Close(_))) | None => return None,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        return session.fail(PushError::closed(error.to_string()));
                    }
                },
            }
        }
    })
    .boxed()
}
