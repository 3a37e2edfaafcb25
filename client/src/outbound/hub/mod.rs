//! SignalR notification hub adapter.
//!
//! Implements the `PushConnector` port over a websocket speaking the
//! SignalR JSON protocol.

mod protocol;
mod ws_connector;

pub use ws_connector::{DEFAULT_PING_INTERVAL, HubConnector};
