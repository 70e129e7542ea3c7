//! Admin backend client.

use std::sync::Arc;

use bazaar_core::{Email, OrderId, OrderRecord, OrderStatus, User};
use reqwest::header::{COOKIE, HeaderName};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::{ApiError, error_message};
use crate::config::BackendConfig;
use crate::resources::{AdminResource, EditableResource};

/// Header carrying the dashboard's API key.
pub const ADMIN_KEY_HEADER: HeaderName = HeaderName::from_static("x-admin-key");

/// The admin's backend session token. Never logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Body returned by `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: AuthToken,
    pub user: User,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: OrderStatus,
}

/// Client for the backend's admin endpoints.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    auth_cookie: String,
    api_key: SecretString,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path or the HTTP
    /// client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        if config.url.cannot_be_a_base() {
            return Err(ApiError::Url(config.url.to_string()));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.url.clone(),
                auth_cookie: config.auth_cookie.clone(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: Option<&AuthToken>) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(ADMIN_KEY_HEADER, self.inner.api_key.expose_secret());
        match token {
            Some(token) => builder.header(
                COOKIE,
                format!("{}={}", self.inner.auth_cookie, token.expose()),
            ),
            None => builder,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => {
                tracing::warn!(path = %response.url().path(), "Backend refused admin request");
                Err(ApiError::Forbidden)
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(response.url().path().to_string())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = error_message(&body);
                if status.is_server_error() {
                    tracing::error!(
                        status = %status,
                        body = %message,
                        "Backend returned server error"
                    );
                }
                Err(ApiError::Backend {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let text = self.execute(request).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Exchange credentials for a backend token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        let body = LoginRequest {
            email: email.as_str(),
            password,
        };
        self.send_json(self.request(Method::POST, url, None).json(&body))
            .await
    }

    /// Invalidate the token on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &AuthToken) -> Result<(), ApiError> {
        let url = self.endpoint(&["auth", "logout"])?;
        self.execute(self.request(Method::POST, url, Some(token)))
            .await
            .map(drop)
    }

    /// Reachability check used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not answer successfully.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["categories"])?;
        self.execute(self.request(Method::GET, url, None))
            .await
            .map(drop)
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// `GET /admin/{resource}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    #[instrument(skip_all, fields(resource = R::PATH))]
    pub async fn list<R: AdminResource>(
        &self,
        token: &AuthToken,
    ) -> Result<Vec<R::Record>, ApiError> {
        let url = self.endpoint(&["admin", R::PATH])?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// `GET /admin/{resource}/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for unknown ids.
    #[instrument(skip_all, fields(resource = R::PATH, id = %id))]
    pub async fn fetch<R: AdminResource>(
        &self,
        token: &AuthToken,
        id: R::Id,
    ) -> Result<R::Record, ApiError> {
        let url = self.endpoint(&["admin", R::PATH, &id.to_string()])?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// `POST /admin/{resource}`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Backend`] with the backend's message when it
    /// rejects the input.
    #[instrument(skip_all, fields(resource = R::PATH))]
    pub async fn create<R: EditableResource>(
        &self,
        token: &AuthToken,
        input: &R::Input,
    ) -> Result<R::Record, ApiError> {
        let url = self.endpoint(&["admin", R::PATH])?;
        self.send_json(self.request(Method::POST, url, Some(token)).json(input))
            .await
    }

    /// `PUT /admin/{resource}/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Backend`] with the backend's message when it
    /// rejects the input.
    #[instrument(skip_all, fields(resource = R::PATH, id = %id))]
    pub async fn update<R: EditableResource>(
        &self,
        token: &AuthToken,
        id: R::Id,
        input: &R::Input,
    ) -> Result<R::Record, ApiError> {
        let url = self.endpoint(&["admin", R::PATH, &id.to_string()])?;
        self.send_json(self.request(Method::PUT, url, Some(token)).json(input))
            .await
    }

    /// `DELETE /admin/{resource}/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all, fields(resource = R::PATH, id = %id))]
    pub async fn delete<R: AdminResource>(
        &self,
        token: &AuthToken,
        id: R::Id,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["admin", R::PATH, &id.to_string()])?;
        self.execute(self.request(Method::DELETE, url, Some(token)))
            .await
            .map(drop)
    }

    /// `PATCH /admin/orders/{id}/status`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Backend`] when the backend refuses the transition.
    #[instrument(skip(self, token))]
    pub async fn update_order_status(
        &self,
        token: &AuthToken,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderRecord, ApiError> {
        let url = self.endpoint(&["admin", "orders", &id.to_string(), "status"])?;
        self.send_json(
            self.request(Method::PATCH, url, Some(token))
                .json(&StatusUpdate { status }),
        )
        .await
    }
}
