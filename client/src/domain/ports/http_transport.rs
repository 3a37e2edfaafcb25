//! Driven port for sending HTTP requests to the SkillSwap API.
//!
//! The transport owns the base URL and credentials (cookies). Everything
//! above it speaks in relative paths and status codes, which keeps the
//! refresh coordination testable without a network.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::define_port_error;

/// HTTP status code returned for missing or expired credentials.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// HTTP verbs used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File upload field.
    File {
        /// Field name.
        name: String,
        /// Client-side file name.
        file_name: String,
        /// MIME type, for example `image/png`.
        content_type: String,
        /// Raw file contents.
        bytes: Vec<u8>,
    },
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(Value),
    /// `multipart/form-data` parts in submission order.
    Multipart(Vec<FormPart>),
}

/// Transport-agnostic API request.
///
/// `path` is relative to the configured base URL (no leading slash).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP verb.
    pub method: Method,
    /// Path relative to the API base URL.
    pub path: String,
    /// Query string pairs in order.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Set once the request has been replayed after a token refresh.
    pub retried: bool,
}

impl ApiRequest {
    /// Build a request with no query and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Shorthand for a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Shorthand for a `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Shorthand for a `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Attach a multipart body.
    #[must_use]
    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Append query pairs.
    #[must_use]
    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Copy of this request flagged as already retried once.
    #[must_use]
    pub fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }
}

/// Raw response as received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Build a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the server rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status == STATUS_UNAUTHORIZED
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

define_port_error! {
    /// Errors raised before any HTTP response was received.
    pub enum TransportError {
        /// The request never produced a response (DNS, TLS, connection reset).
        Network {
            /// Human-readable detail.
            message: String,
        } =>
            "network failure: {message}",
        /// The request exceeded the configured timeout.
        Timeout {
            /// Human-readable detail.
            message: String,
        } =>
            "request timed out: {message}",
        /// The request could not be built (bad path, bad multipart part).
        InvalidRequest {
            /// Human-readable detail.
            message: String,
        } =>
            "request could not be built: {message}",
    }
}

/// Port for sending requests to the SkillSwap API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and return whatever response the server produced.
    ///
    /// Non-2xx statuses are *not* errors at this layer; only failures to
    /// obtain a response are.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for request and response helpers.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(200, true)]
    #[case(204, true)]
    #[case(299, true)]
    #[case(301, false)]
    #[case(401, false)]
    #[case(500, false)]
    fn success_range_is_2xx(#[case] status: u16, #[case] expected: bool) {
        assert_eq!(ApiResponse::new(status, Vec::new()).is_success(), expected);
    }

    #[test]
    fn retry_copy_keeps_everything_but_the_flag() {
        let request = ApiRequest::put("listings/1")
            .with_json(json!({ "title": "Rust" }))
            .with_query(vec![("a".to_owned(), "b".to_owned())]);
        let retry = request.clone().into_retry();

        assert!(!request.retried);
        assert!(retry.retried);
        assert_eq!(retry.path, request.path);
        assert_eq!(retry.body, request.body);
        assert_eq!(retry.query, request.query);
    }

    #[test]
    fn decodes_json_bodies() {
        let response = ApiResponse::new(200, br#"{"value":3}"#.to_vec());
        let value: Value = response.json().expect("valid JSON");
        assert_eq!(value, json!({ "value": 3 }));
    }
}
