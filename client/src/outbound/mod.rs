//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed transport for the REST API
//! - **hub**: websocket connector for the notification hub
//!
//! Both adapters share one cookie jar, so the session cookies set by login
//! and refresh also authenticate the hub connection.

pub mod http;
pub mod hub;
