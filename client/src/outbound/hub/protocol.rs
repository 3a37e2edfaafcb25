//! SignalR JSON hub protocol framing.
//!
//! Every message is a JSON object terminated by the ASCII record separator.
//! The client opens with a handshake naming the protocol; the hub answers
//! `{}` or `{"error": "..."}` and may batch further messages into the same
//! websocket frame.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::endpoints::NOTIFICATION_EVENT;
use crate::domain::Notification;
use crate::domain::ports::PushError;

/// Terminates every protocol message.
pub const RECORD_SEPARATOR: char = '\u{1e}';

const INVOCATION: u8 = 1;
const PING: u8 = 6;
const CLOSE: u8 = 7;

/// Handshake selecting the JSON protocol.
pub fn handshake_request() -> String {
    frame(&json!({ "protocol": "json", "version": 1 }))
}

/// Keep-alive ping.
pub fn ping_message() -> String {
    frame(&json!({ "type": PING }))
}

fn frame(value: &Value) -> String {
    format!("{value}{RECORD_SEPARATOR}")
}

/// Message decoded from the hub.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// `ReceiveNotification` invocation.
    Notification(Notification),
    /// Hub keep-alive.
    Ping,
    /// The hub is closing the connection, optionally with an error.
    Close(Option<String>),
    /// Anything the client does not act on.
    Ignored,
}

#[derive(Deserialize)]
struct HandshakeReply {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Incremental decoder; the first record must be the handshake reply.
#[derive(Debug, Default)]
pub struct HubDecoder {
    handshaken: bool,
}

impl HubDecoder {
    /// Whether the handshake reply has been accepted.
    pub fn is_handshaken(&self) -> bool {
        self.handshaken
    }

    /// Decode one websocket text frame into zero or more messages.
    ///
    /// # Errors
    ///
    /// [`PushError::Handshake`] for a rejected or malformed handshake reply,
    /// [`PushError::Protocol`] for malformed messages.
    pub fn decode(&mut self, payload: &str) -> Result<Vec<Inbound>, PushError> {
        let mut decoded = Vec::new();
        for record in payload
            .split(RECORD_SEPARATOR)
            .filter(|record| !record.trim().is_empty())
        {
            if self.handshaken {
                decoded.push(parse_message(record)?);
            } else {
                parse_handshake(record)?;
                self.handshaken = true;
            }
        }
        Ok(decoded)
    }
}

fn parse_handshake(record: &str) -> Result<(), PushError> {
    let reply: HandshakeReply = serde_json::from_str(record)
        .map_err(|error| PushError::handshake(format!("invalid handshake reply: {error}")))?;
    match reply.error {
        Some(error) => Err(PushError::handshake(error)),
        None => Ok(()),
    }
}

fn parse_message(record: &str) -> Result<Inbound, PushError> {
    let message: RawMessage = serde_json::from_str(record)
        .map_err(|error| PushError::protocol(format!("invalid hub message: {error}")))?;
    match message.kind {
        INVOCATION => parse_invocation(message),
        PING => Ok(Inbound::Ping),
        CLOSE => Ok(Inbound::Close(message.error)),
        _ => Ok(Inbound::Ignored),
    }
}

fn parse_invocation(message: RawMessage) -> Result<Inbound, PushError> {
    let is_notification = message
        .target
        .as_deref()
        .is_some_and(|target| target.eq_ignore_ascii_case(NOTIFICATION_EVENT));
    if !is_notification {
        return Ok(Inbound::Ignored);
    }
    let payload = message
        .arguments
        .into_iter()
        .next()
        .ok_or_else(|| PushError::protocol("notification invocation without arguments"))?;
    serde_json::from_value(payload)
        .map(Inbound::Notification)
        .map_err(|error| PushError::protocol(format!("invalid notification payload: {error}")))
}
