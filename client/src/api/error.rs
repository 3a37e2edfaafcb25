//! Errors returned by [`ApiClient`](super::ApiClient) calls.

use serde_json::Value;

use crate::domain::ports::{TransportError, define_port_error};

const PREVIEW_CHAR_LIMIT: usize = 160;

define_port_error! {
    /// Failure of an API call as seen by stores and callers.
    pub enum ApiError {
        /// No response was received.
        Network {
            /// Human-readable detail.
            message: String,
        } =>
            "network failure: {message}",
        /// The request timed out before a response arrived.
        Timeout {
            /// Human-readable detail.
            message: String,
        } =>
            "request timed out: {message}",
        /// The request could not be encoded.
        InvalidRequest {
            /// Human-readable detail.
            message: String,
        } =>
            "request could not be built: {message}",
        /// Credentials were rejected and no refresh could be attempted.
        Unauthorized {
            /// Human-readable detail.
            message: String,
        } =>
            "unauthorized: {message}",
        /// The token refresh failed; the session has been ended.
        SessionExpired {
            /// Human-readable detail.
            message: String,
        } =>
            "session expired: {message}",
        /// Any other non-success status.
        Status {
            /// HTTP status code.
            status: u16,
            /// Human-readable detail.
            message: String,
        } =>
            "request failed with status {status}: {message}",
        /// The response body did not match the expected shape.
        Decode {
            /// Human-readable detail.
            message: String,
        } =>
            "response could not be decoded: {message}",
    }
}

impl ApiError {
    /// Whether the failure means the user must sign in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::SessionExpired { .. })
    }

    /// HTTP status, when a response was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    /// Build the error for a non-success response.
    pub(crate) fn from_response(status: u16, body: &[u8]) -> Self {
        let message = response_message(status, body);
        if status == 401 {
            Self::unauthorized(message)
        } else {
            Self::status(status, message)
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Network { message } => Self::Network { message },
            TransportError::Timeout { message } => Self::Timeout { message },
            TransportError::InvalidRequest { message } => Self::InvalidRequest { message },
        }
    }
}

/// Best human-readable message for an error response.
///
/// Prefers the backend's `message`, `title` or `error` JSON field, then a
/// compacted preview of the body, then the bare status.
fn response_message(status: u16, body: &[u8]) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        let field = ["message", "title", "error"]
            .into_iter()
            .find_map(|key| map.get(key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|text| !text.is_empty());
        if let Some(text) = field {
            return text.to_owned();
        }
    }
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {status}")
    } else {
        preview
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for response error mapping.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(br#"{"message":"Listing not found"}"#.as_slice(), "Listing not found")]
    #[case(br#"{"title":"One or more validation errors occurred."}"#.as_slice(), "One or more validation errors occurred.")]
    #[case(br#"{"error":"  invalid_grant "}"#.as_slice(), "invalid_grant")]
    #[case(b"  upstream\n\n  unavailable ".as_slice(), "upstream unavailable")]
    #[case(b"".as_slice(), "status 503")]
    #[case(br#"{"message":""}"#.as_slice(), r#"{"message":""}"#)]
    fn picks_the_most_useful_message(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(response_message(503, body), expected);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(PREVIEW_CHAR_LIMIT + 10);
        let message = response_message(500, body.as_bytes());
        assert!(message.ends_with("..."));
        assert_eq!(message.chars().count(), PREVIEW_CHAR_LIMIT + 3);
    }

    #[rstest]
    #[case(401, true, Some(401))]
    #[case(403, false, Some(403))]
    #[case(500, false, Some(500))]
    fn from_response_classifies_statuses(
        #[case] status: u16,
        #[case] requires_login: bool,
        #[case] expected_status: Option<u16>,
    ) {
        let error = ApiError::from_response(status, b"");
        assert_eq!(error.requires_login(), requires_login);
        assert_eq!(error.http_status(), expected_status);
    }

    #[test]
    fn transport_errors_keep_their_category() {
        assert!(matches!(
            ApiError::from(TransportError::timeout("30s")),
            ApiError::Timeout { .. }
        ));
        assert!(matches!(
            ApiError::from(TransportError::network("reset")),
            ApiError::Network { .. }
        ));
    }
}
