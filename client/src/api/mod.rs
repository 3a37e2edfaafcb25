//! HTTP API access: the authenticated client, endpoint paths and errors.

mod client;
pub mod endpoints;
mod error;
mod refresh;

#[cfg(test)]
pub use client::MockSessionHooks;
pub use client::{ApiClient, SessionHooks};
pub use error::ApiError;
