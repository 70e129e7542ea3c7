//! Integration tests for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! Nothing external is needed: every test starts a [`StubBackend`] and the
//! app under test on ephemeral local ports, then drives the app over HTTP
//! with a [`Browser`] that keeps cookies and does not follow redirects.
//!
//! # Test Files
//!
//! - `storefront_cart` - Cart mutations against the backend
//! - `storefront_checkout` - The four step checkout wizard
//! - `admin_dashboard` - Admin access control, product CRUD and order status

pub mod backend;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use bazaar_core::SummaryRules;
use reqwest::{Client, Response, redirect::Policy};
use secrecy::SecretString;
use url::Url;

pub use backend::{ADMIN_KEY, AUTH_COOKIE, BackendState, CartGate, PASSWORD, StubBackend};

/// Serve a router on an ephemeral port with peer addresses available.
async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind app");
    let addr = listener.local_addr().expect("Failed to read app address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("App server failed");
    });

    format!("http://{addr}")
}

/// Start the storefront against `backend_url`; returns its base URL.
///
/// # Panics
///
/// Panics if the app cannot be built or bound.
pub async fn spawn_storefront(backend_url: Url) -> String {
    use bazaar_storefront::config::{BackendConfig, StorefrontConfig};

    let config = StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        base_url: "http://localhost".to_string(),
        backend: BackendConfig {
            url: backend_url,
            auth_cookie: AUTH_COOKIE.to_string(),
            timeout: Duration::from_secs(5),
        },
        catalog_cache_ttl: Duration::from_secs(60),
        checkout: SummaryRules::default(),
        static_dir: PathBuf::from("../storefront/static"),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state =
        bazaar_storefront::state::AppState::new(config).expect("Failed to build storefront");
    serve(bazaar_storefront::app(state)).await
}

/// Start the admin dashboard against `backend_url`; returns its base URL.
///
/// # Panics
///
/// Panics if the app cannot be built or bound.
pub async fn spawn_admin(backend_url: Url) -> String {
    use bazaar_admin::config::{AdminConfig, BackendConfig};

    let config = AdminConfig {
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        base_url: "http://localhost".to_string(),
        backend: BackendConfig {
            url: backend_url,
            auth_cookie: AUTH_COOKIE.to_string(),
            timeout: Duration::from_secs(5),
            api_key: SecretString::from(ADMIN_KEY.to_string()),
        },
        static_dir: PathBuf::from("../admin/static"),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = bazaar_admin::state::AppState::new(config).expect("Failed to build admin");
    serve(bazaar_admin::app(state)).await
}

/// HTTP client with a cookie jar, pointed at one app.
pub struct Browser {
    client: Client,
    base_url: String,
}

impl Browser {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// Submit a form as a browser would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Log in through the app's own login form.
    ///
    /// # Panics
    ///
    /// Panics unless the app answers with a redirect.
    pub async fn login(&self, path: &str, email: &str) -> Response {
        let response = self
            .post(path, &[("email", email), ("password", PASSWORD)])
            .await;
        assert!(
            response.status().is_redirection(),
            "login answered {}",
            response.status()
        );
        response
    }
}

/// Where a redirect response points.
///
/// # Panics
///
/// Panics if the response has no readable `Location` header.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("no Location header")
        .to_str()
        .expect("Location is not ASCII")
        .to_string()
}
