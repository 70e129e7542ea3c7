//! HTTP plumbing shared by every backend call.

use std::sync::Arc;
use std::time::Duration;

use bazaar_core::{Email, User};
use moka::future::Cache;
use reqwest::header::COOKIE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, error_message};
use crate::config::BackendConfig;

// =============================================================================
// AuthToken
// =============================================================================

/// The shopper's backend session token.
///
/// Lives in the server-side session and is forwarded to the backend as a
/// cookie. Never logged.
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

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the shop's REST backend.
///
/// Cheap to clone. Catalog reads are cached for the configured TTL; carts,
/// addresses and orders always hit the network.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    auth_cookie: String,
    timeout: Duration,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path or the HTTP
    /// client cannot be built.
    pub fn new(config: &BackendConfig, cache_ttl: Duration) -> Result<Self, ApiError> {
        if config.url.cannot_be_a_base() {
            return Err(ApiError::Url(config.url.to_string()));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.url.clone(),
                auth_cookie: config.auth_cookie.clone(),
                timeout: config.timeout,
                cache,
            }),
        })
    }

    /// Upper bound on a single backend call.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Build an endpoint URL by appending path segments to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request, attaching the auth cookie when a token is given.
    pub(crate) fn request(
        &self,
        method: Method,
        url: Url,
        token: Option<&AuthToken>,
    ) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.header(
                COOKIE,
                format!("{}={}", self.inner.auth_cookie, token.expose()),
            ),
            None => builder,
        }
    }

    pub(crate) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }

    /// Send a request and map non-success statuses to [`ApiError`].
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(response.url().path().to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(1);
                Err(ApiError::RateLimited(retry_after))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = error_message(&body);
                if status.is_server_error() {
                    tracing::error!(
                        status = %status,
                        body = %message,
                        "Backend returned server error"
                    );
                } else {
                    tracing::debug!(status = %status, body = %message, "Backend rejected request");
                }
                Err(ApiError::Backend {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Send a request and decode its JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose body we do not need.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.execute(request).await?;
        Ok(())
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
        self.send_empty(self.request(Method::POST, url, Some(token)))
            .await
    }

    /// Cheap reachability check used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not answer successfully.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["categories"])?;
        self.send_empty(self.request(Method::GET, url, None)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        let config = BackendConfig {
            url: Url::parse(base).unwrap(),
            auth_cookie: "token".to_string(),
            timeout: Duration::from_secs(1),
        };
        BackendClient::new(&config, Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("http://127.0.0.1:5000/api");
        let url = client.endpoint(&["cart", "items", "42"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/api/cart/items/42");
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let client = client("http://127.0.0.1:5000/api/");
        let url = client.endpoint(&["orders"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/api/orders");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = client("http://127.0.0.1:5000");
        let url = client.endpoint(&["products", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/products/a%2Fb");
    }

    #[test]
    fn test_request_attaches_auth_cookie() {
        let client = client("http://127.0.0.1:5000/api");
        let url = client.endpoint(&["cart"]).unwrap();
        let request = client
            .request(Method::GET, url, Some(&AuthToken::new("abc123".to_string())))
            .build()
            .unwrap();
        assert_eq!(request.headers()[COOKIE], "token=abc123");
    }

    #[test]
    fn test_token_debug_redacted() {
        let token = AuthToken::new("super-secret".to_string());
        assert!(!format!("{token:?}").contains("super-secret"));
    }

    #[test]
    fn test_rejects_non_base_url() {
        let config = BackendConfig {
            url: Url::parse("mailto:ops@bazaar.in").unwrap(),
            auth_cookie: "token".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(
            BackendClient::new(&config, Duration::from_secs(1)),
            Err(ApiError::Url(_))
        ));
    }
}
