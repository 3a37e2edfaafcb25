//! HTTP outbound adapter.
//!
//! This module provides the reqwest implementation of the `HttpTransport`
//! port.

mod reqwest_transport;

pub use reqwest_transport::{DEFAULT_USER_AGENT, ReqwestTransport};
