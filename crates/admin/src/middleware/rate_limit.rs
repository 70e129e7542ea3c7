//! Rate limiting for the admin login form.
//!
//! The dashboard binds to a private address, so the peer address is the
//! client. Serve with `into_make_service_with_connect_info::<SocketAddr>()`.

use std::sync::Arc;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for login: ~6 attempts per minute per IP.
///
/// Configuration: 1 request every 10 seconds (replenish), burst of 3.
///
/// # Panics
///
/// This function will not panic. `per_second(10)` and `burst_size(3)` are
/// both non-zero, which is all `GovernorConfigBuilder` checks.
#[must_use]
pub fn login_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(PeerIpKeyExtractor)
        .per_second(10)
        .burst_size(3)
        .finish()
        .expect("rate limiter config with per_second(10) and burst_size(3) is valid");
    GovernorLayer::new(Arc::new(config))
}
