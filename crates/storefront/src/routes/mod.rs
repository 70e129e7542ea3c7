//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page (banners, categories, featured)
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (backend reachable)
//!
//! # Catalog
//! GET  /products                   - Product listing (?q=&category=)
//! GET  /products/{id}              - Product detail with reviews
//! POST /products/{id}/reviews      - Post a review (requires auth)
//! GET  /categories/{id}            - Category listing
//!
//! # Cart (requires auth)
//! GET  /cart                       - Cart page
//! POST /cart/add                   - Add a product
//! POST /cart/update                - Change a line's quantity
//! POST /cart/remove                - Remove a line
//!
//! # Checkout (requires auth)
//! GET  /checkout                   - Start a fresh wizard (?product_id=&quantity= for buy now)
//! POST /checkout/shipping          - Step 1 -> 2
//! POST /checkout/address           - Select or delete a saved address on step 1
//! POST /checkout/payment           - Step 2 -> 3
//! POST /checkout/back              - Go back one step, or to ?step=
//! POST /checkout/place             - Step 3 -> 4 (rate limited)
//!
//! # Account (requires auth)
//! GET  /account/orders             - Order history
//! GET  /account/addresses          - Address list
//! POST /account/addresses          - Create address
//! GET  /account/addresses/new      - New address form
//! GET  /account/addresses/{id}/edit - Edit address form
//! POST /account/addresses/{id}     - Update address
//! POST /account/addresses/{id}/delete  - Delete address
//! POST /account/addresses/{id}/primary - Make address primary
//!
//! # Auth
//! GET  /auth/login                 - Login page
//! POST /auth/login                 - Login action (rate limited)
//! POST /auth/logout                - Logout action
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;

use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, de};

use crate::middleware::{login_rate_limiter, order_rate_limiter};
use crate::state::AppState;

/// Deserialize an optional form or query value, treating `""` as absent.
///
/// HTML forms submit empty inputs as `field=`, which would otherwise fail
/// to parse as a number.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", post(products::create_review))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::start))
        .route("/shipping", post(checkout::shipping))
        .route("/address", post(checkout::address))
        .route("/payment", post(checkout::payment))
        .route("/back", post(checkout::back))
        .route("/place", post(checkout::place).layer(order_rate_limiter()))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index))
        .route(
            "/addresses",
            get(addresses::index).post(addresses::create),
        )
        .route("/addresses/new", get(addresses::new))
        .route("/addresses/{id}", post(addresses::update))
        .route("/addresses/{id}/edit", get(addresses::edit))
        .route("/addresses/{id}/delete", post(addresses::delete))
        .route("/addresses/{id}/primary", post(addresses::make_primary))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(login_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .route("/categories/{id}", get(products::category))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the REST backend is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Backend not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
