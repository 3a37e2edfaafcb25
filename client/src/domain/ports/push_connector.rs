//! Driven port for the real-time notification hub.
//!
//! A connector opens one push connection and hands back a stream of events.
//! The stream ending (or yielding an error) means the connection is gone;
//! reconnection policy lives in the channel supervisor, not here.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::define_port_error;
use crate::domain::Notification;

/// Event delivered over the push connection.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// A new notification addressed to the signed-in user.
    Notification(Notification),
}

define_port_error! {
    /// Errors raised by push connections.
    pub enum PushError {
        /// The socket could not be opened.
        Connect {
            /// Human-readable detail.
            message: String,
        } =>
            "push connection failed: {message}",
        /// The hub rejected or garbled the protocol handshake.
        Handshake {
            /// Human-readable detail.
            message: String,
        } =>
            "push handshake failed: {message}",
        /// A frame could not be decoded or violated the protocol.
        Protocol {
            /// Human-readable detail.
            message: String,
        } =>
            "push protocol error: {message}",
        /// The hub closed the connection with an error.
        Closed {
            /// Human-readable detail.
            message: String,
        } =>
            "push connection closed: {message}",
    }
}

/// Stream of events from one live push connection.
pub type PushStream = BoxStream<'static, Result<PushEvent, PushError>>;

/// Port for opening push connections.
#[async_trait]
pub trait PushConnector: Send + Sync {
    /// Open a new connection using the current session credentials.
    async fn connect(&self) -> Result<PushStream, PushError>;
}
