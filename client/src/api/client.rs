//! Authenticated HTTP client with refresh-and-replay on `401`.
//!
//! Every request goes to the transport unmodified. An unauthorized response
//! triggers at most one concurrent session refresh, supplied by the
//! registered [`SessionHooks`]; once it succeeds the original request is
//! replayed exactly once. Requests to the refresh endpoint and requests that
//! were already replayed never start a new cycle.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::endpoints;
use super::error::ApiError;
use super::refresh::RefreshCoordinator;
use crate::domain::ports::{ApiRequest, ApiResponse, FormPart, HttpTransport};

/// Session callbacks the client needs to recover from an expired token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionHooks: Send + Sync {
    /// Obtain fresh credentials. Called at most once per refresh cycle.
    async fn refresh_session(&self) -> Result<(), ApiError>;

    /// End the local session after a failed refresh.
    fn session_expired(&self);
}

/// HTTP client shared by every store.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    coordinator: RefreshCoordinator,
    hooks: RwLock<Option<Weak<dyn SessionHooks>>>,
}

impl ApiClient {
    /// Wrap a transport. No refresh is attempted until hooks are registered.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            coordinator: RefreshCoordinator::default(),
            hooks: RwLock::new(None),
        }
    }

    /// Register the refresh and logout callbacks.
    ///
    /// Only a weak reference is kept, so the hooks may themselves own the
    /// client.
    pub fn register_session_hooks<H>(&self, hooks: &Arc<H>)
    where
        H: SessionHooks + 'static,
    {
        let weak: Weak<H> = Arc::downgrade(hooks);
        let weak: Weak<dyn SessionHooks> = weak;
        *self.hooks.write().unwrap_or_else(PoisonError::into_inner) = Some(weak);
    }

    /// Send a request, refreshing the session and replaying once on `401`.
    ///
    /// The raw response is returned whatever its status.
    ///
    /// # Errors
    ///
    /// Transport failures map to [`ApiError::Network`], [`ApiError::Timeout`]
    /// or [`ApiError::InvalidRequest`] without any refresh attempt. A failed
    /// refresh yields [`ApiError::SessionExpired`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.dispatch(&request).await?;
        if !needs_refresh(&request, &response) {
            return Ok(response);
        }
        let Some(hooks) = self.session_hooks() else {
            debug!(path = %request.path, "unauthorized with no session hooks registered");
            return Ok(response);
        };

        self.coordinator
            .refresh_or_wait(
                || async {
                    hooks
                        .refresh_session()
                        .await
                        .map_err(|error| ApiError::session_expired(error.to_string()))
                },
                || {
                    warn!("session refresh failed; ending session");
                    hooks.session_expired();
                },
            )
            .await?;

        self.dispatch(&request.into_retry()).await
    }

    /// Send a request and reject any non-success status.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::send`], plus [`ApiError::Unauthorized`] or
    /// [`ApiError::Status`] for non-2xx responses.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response.status, &response.body))
        }
    }

    /// Send a request and decode its JSON body.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::execute`], plus [`ApiError::Decode`] when the body
    /// does not match `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json()
            .map_err(|error| ApiError::decode(error.to_string()))
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(ApiRequest::get(path)).await
    }

    /// `POST` a JSON body and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidRequest`] when `body` cannot be serialised, else
    /// see [`ApiClient::fetch`].
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(path).with_json(to_json(body)?);
        self.fetch(request).await
    }

    /// `PUT` a JSON body and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidRequest`] when `body` cannot be serialised, else
    /// see [`ApiClient::fetch`].
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::put(path).with_json(to_json(body)?);
        self.fetch(request).await
    }

    /// `PUT` a JSON body, ignoring any reply body.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidRequest`] when `body` cannot be serialised, else
    /// see [`ApiClient::execute`].
    pub async fn put<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let request = ApiRequest::put(path).with_json(to_json(body)?);
        self.execute(request).await.map(drop)
    }

    /// `POST` a multipart form and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        parts: Vec<FormPart>,
    ) -> Result<T, ApiError> {
        self.fetch(ApiRequest::post(path).with_multipart(parts))
            .await
    }

    /// `DELETE` a resource, ignoring any reply body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(path)).await.map(drop)
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        match self.transport.send(request).await {
            Ok(response) => {
                debug!(
                    method = request.method.as_str(),
                    path = %request.path,
                    status = response.status,
                    retried = request.retried,
                    "api response"
                );
                Ok(response)
            }
            Err(error) => {
                warn!(
                    method = request.method.as_str(),
                    path = %request.path,
                    error = %error,
                    "api request failed without a response"
                );
                Err(error.into())
            }
        }
    }

    fn session_hooks(&self) -> Option<Arc<dyn SessionHooks>> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

fn needs_refresh(request: &ApiRequest, response: &ApiResponse) -> bool {
    response.is_unauthorized() && !request.retried && request.path != endpoints::REFRESH
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|error| ApiError::invalid_request(error.to_string()))
}

#[cfg(test)]
mod tests {
    //! Unit coverage for refresh interception.
    use super::*;
    use crate::domain::ports::{MockHttpTransport, TransportError};
    use mockall::Sequence;
    use rstest::rstest;
    use serde_json::json;

    fn client_with(transport: MockHttpTransport) -> ApiClient {
        ApiClient::new(Arc::new(transport))
    }

    fn ok_json(value: &serde_json::Value) -> ApiResponse {
        ApiResponse::new(200, value.to_string())
    }

    #[tokio::test]
    async fn successful_responses_pass_through() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| request.path == "listings" && !request.retried)
            .times(1)
            .returning(|_| Ok(ok_json(&json!([]))));
        let client = client_with(transport);
        let hooks = Arc::new(MockSessionHooks::new());
        client.register_session_hooks(&hooks);

        let listings: Vec<serde_json::Value> =
            client.get_json("listings").await.expect("listings");
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_response_refreshes_and_replays_once() {
        let mut sequence = Sequence::new();
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| !request.retried)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(ApiResponse::new(401, "")));
        transport
            .expect_send()
            .withf(|request| request.retried && request.path == "notifications")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(ok_json(&json!({"ok": true}))));

        let mut hooks = MockSessionHooks::new();
        hooks.expect_refresh_session().times(1).returning(|| Ok(()));
        hooks.expect_session_expired().never();
        let hooks = Arc::new(hooks);
        let client = client_with(transport);
        client.register_session_hooks(&hooks);

        let response = client
            .execute(ApiRequest::get("notifications"))
            .await
            .expect("replayed request");
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn failed_refresh_expires_session_and_rejects() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(401, "")));
        let mut hooks = MockSessionHooks::new();
        hooks
            .expect_refresh_session()
            .times(1)
            .returning(|| Err(ApiError::unauthorized("refresh token expired")));
        hooks.expect_session_expired().times(1).return_const(());
        let hooks = Arc::new(hooks);
        let client = client_with(transport);
        client.register_session_hooks(&hooks);

        let error = client
            .execute(ApiRequest::get("auth/profile"))
            .await
            .expect_err("refresh failure");
        assert!(matches!(error, ApiError::SessionExpired { .. }));
        assert!(error.requires_login());
    }

    #[rstest]
    #[case::refresh_endpoint(ApiRequest::post(endpoints::REFRESH))]
    #[case::already_retried(ApiRequest::get("listings").into_retry())]
    #[tokio::test]
    async fn exempt_requests_surface_unauthorized(#[case] request: ApiRequest) {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(401, r#"{"message":"expired"}"#)));
        let mut hooks = MockSessionHooks::new();
        hooks.expect_refresh_session().never();
        hooks.expect_session_expired().never();
        let hooks = Arc::new(hooks);
        let client = client_with(transport);
        client.register_session_hooks(&hooks);

        let error = client.execute(request).await.expect_err("unauthorized");
        assert_eq!(error, ApiError::unauthorized("expired"));
    }

    #[tokio::test]
    async fn network_failures_bypass_refresh() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(TransportError::network("connection reset")));
        let mut hooks = MockSessionHooks::new();
        hooks.expect_refresh_session().never();
        let hooks = Arc::new(hooks);
        let client = client_with(transport);
        client.register_session_hooks(&hooks);

        let error = client
            .execute(ApiRequest::get("listings"))
            .await
            .expect_err("network failure");
        assert!(matches!(error, ApiError::Network { .. }));
    }

    #[tokio::test]
    async fn dropped_hooks_leave_unauthorized_untouched() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(401, "")));
        let client = client_with(transport);
        {
            let hooks = Arc::new(MockSessionHooks::new());
            client.register_session_hooks(&hooks);
        }

        let error = client
            .execute(ApiRequest::get("listings"))
            .await
            .expect_err("unauthorized");
        assert!(matches!(error, ApiError::Unauthorized { .. }));
    }

    /// Hooks that own the client they are registered with.
    struct OwningHooks {
        client: Arc<ApiClient>,
        refreshes: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl SessionHooks for OwningHooks {
        async fn refresh_session(&self) -> Result<(), ApiError> {
            self.refreshes
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }

        fn session_expired(&self) {}
    }

    #[tokio::test]
    async fn concrete_hooks_are_held_weakly() {
        let mut sequence = Sequence::new();
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(ApiResponse::new(401, "")));
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(ApiResponse::new(204, "")));
        let client = Arc::new(client_with(transport));
        let hooks = Arc::new(OwningHooks {
            client: Arc::clone(&client),
            refreshes: std::sync::atomic::AtomicUsize::new(0),
        });
        client.register_session_hooks(&hooks);

        hooks
            .client
            .execute(ApiRequest::get("notifications"))
            .await
            .expect("replayed request");

        assert_eq!(
            hooks.refreshes.load(std::sync::atomic::Ordering::SeqCst),
            1
        );
        assert_eq!(Arc::strong_count(&hooks), 1);
        drop(hooks);
        assert_eq!(Arc::strong_count(&client), 1);
    }

    #[tokio::test]
    async fn non_success_statuses_carry_the_backend_message() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().returning(|_| {
            Ok(ApiResponse::new(
                404,
                r#"{"message":"Listing not found"}"#,
            ))
        });
        let client = client_with(transport);

        let error = client
            .delete("listings/unknown")
            .await
            .expect_err("not found");
        assert_eq!(error, ApiError::status(404_u16, "Listing not found"));
    }

    #[tokio::test]
    async fn undecodable_bodies_become_decode_errors() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(ApiResponse::new(200, "<html>")));
        let client = client_with(transport);

        let error = client
            .get_json::<Vec<String>>("listings")
            .await
            .expect_err("decode");
        assert!(matches!(error, ApiError::Decode { .. }));
    }
}
