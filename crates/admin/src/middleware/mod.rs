//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions with in-memory store, SameSite=Strict)
//! 4. Security headers (stricter CSP for admin)
//! 5. Rate limiting on `POST /login`
//!
//! Authorization is per handler through the [`RequireAdmin`] extractor.

pub mod auth;
pub mod rate_limit;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, clear_current_admin, set_current_admin};
pub use rate_limit::login_rate_limiter;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
