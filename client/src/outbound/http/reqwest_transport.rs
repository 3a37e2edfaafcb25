//! Reqwest-backed API transport.
//!
//! This adapter owns transport details only: URL resolution against the
//! base URL, body encoding, the cookie jar and timeout mapping. Status codes
//! are handed back untouched for the API client to interpret.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::trace;

use crate::domain::ports::{
    ApiRequest, ApiResponse, FormPart, HttpTransport, Method, RequestBody, TransportError,
};

/// User agent sent with every API request.
pub const DEFAULT_USER_AGENT: &str = "skillswap-client/0.1";

/// Sends API requests with a shared cookie jar.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build a transport rooted at `base_url`.
    ///
    /// `base_url` must end with a slash so relative paths append to it.
    /// `cookies` is shared with the hub connector.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        cookies: Arc<Jar>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .cookie_provider(cookies)
            .user_agent(DEFAULT_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| TransportError::invalid_request(format!("bad path {path:?}: {error}")))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request.path)?;
        trace!(method = request.method.as_str(), %url, "sending API request");
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn build_form(parts: &[FormPart]) -> Result<Form, TransportError> {
    parts.iter().try_fold(Form::new(), |form, part| match part {
        FormPart::Text { name, value } => Ok(form.text(name.clone(), value.clone())),
        FormPart::File {
            name,
            file_name,
            content_type,
            bytes,
        } => {
            let file = Part::bytes(bytes.clone())
                .file_name(file_name.clone())
                .mime_str(content_type)
                .map_err(|error| {
                    TransportError::invalid_request(format!(
                        "invalid content type {content_type:?}: {error}"
                    ))
                })?;
            Ok(form.part(name.clone(), file))
        }
    })
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else {
        TransportError::network(error.to_string())
    }
}
