//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod http_transport;
mod push_connector;
mod sleeper;

#[cfg(test)]
pub use http_transport::MockHttpTransport;
pub use http_transport::{
    ApiRequest, ApiResponse, FormPart, HttpTransport, Method, RequestBody, STATUS_UNAUTHORIZED,
    TransportError,
};
pub use push_connector::{PushConnector, PushError, PushEvent, PushStream};
pub use sleeper::{Sleeper, TokioSleeper};
