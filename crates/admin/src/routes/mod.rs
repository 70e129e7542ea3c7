//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Dashboard
//! GET  /                       - Overview: counts, revenue, recent orders, low stock
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action (rate limited)
//! POST /logout                 - Logout
//!
//! # Products, categories, banners (full CRUD)
//! GET  /{resource}             - List
//! POST /{resource}             - Create
//! GET  /{resource}/new         - New form
//! GET  /{resource}/{id}/edit   - Edit form
//! POST /{resource}/{id}        - Update
//! POST /{resource}/{id}/delete - Delete
//!
//! # Reviews (moderation)
//! GET  /reviews                - List
//! POST /reviews/{id}/delete    - Delete
//!
//! # Orders
//! GET  /orders                 - List (?status=)
//! GET  /orders/{id}            - Detail
//! POST /orders/{id}/status     - Change status
//! ```

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod resources;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::login_rate_limiter;
use crate::resources::{Banners, Categories, Products, Reviews};
use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create all routes for the admin dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(login_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
        .nest("/products", resources::editable::<Products>())
        .nest("/categories", resources::editable::<Categories>())
        .nest("/banners", resources::editable::<Banners>())
        .nest("/reviews", resources::moderated::<Reviews>())
        .nest("/orders", order_routes())
}

/// Liveness health check endpoint.
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
