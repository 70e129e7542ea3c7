//! Cart synchronization.
//!
//! The backend owns the cart. Every mutation is one network call followed
//! by a full refetch, and the session carries a pending marker for the time
//! in between so checkout cannot start against a stale cart.
//!
//! The marker is the mutation's start time. A handler that is dropped
//! mid-mutation never clears it, so a marker older than twice the backend
//! timeout (mutation plus refetch) counts as abandoned.

use std::future::Future;
use std::time::Duration;

use bazaar_core::Cart;
use chrono::{DateTime, Utc};
use tower_sessions::Session;

use crate::api::{ApiError, AuthToken, BackendClient};
use crate::error::AppError;
use crate::models::session_keys;

/// The cart after a mutation, plus the mutation's own failure if it had one.
#[derive(Debug)]
pub struct Synced {
    pub cart: Cart,
    pub error: Option<ApiError>,
}

/// Cart operations for one shopper.
pub struct CartSync<'a> {
    backend: &'a BackendClient,
    session: &'a Session,
    token: &'a AuthToken,
}

impl<'a> CartSync<'a> {
    #[must_use]
    pub const fn new(
        backend: &'a BackendClient,
        session: &'a Session,
        token: &'a AuthToken,
    ) -> Self {
        Self {
            backend,
            session,
            token,
        }
    }

    /// Fetch the cart, carrying over the session's pending marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn fetch(&self) -> Result<Cart, AppError> {
        let mut cart = self.backend.cart(self.token).await?;
        cart.pending_updates = is_pending(self.session, stale_after(self.backend)).await;
        Ok(cart)
    }

    /// Run a mutation, then refetch.
    ///
    /// The refetch happens whether or not the mutation succeeded, so the
    /// page always shows what the backend holds. A failed mutation comes
    /// back in [`Synced::error`] for the caller to surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the refetch fails, the session cannot be
    /// written, or the backend rejects the shopper's token.
    pub async fn apply<F>(&self, mutation: F) -> Result<Synced, AppError>
    where
        F: Future<Output = Result<(), ApiError>>,
    {
        self.session
            .insert(session_keys::CART_PENDING, Utc::now())
            .await?;
        self.session.save().await?;

        let outcome = mutation.await;
        let refetched = self.backend.cart(self.token).await;

        self.session
            .remove::<DateTime<Utc>>(session_keys::CART_PENDING)
            .await?;
        let cart = refetched?;

        match outcome {
            Ok(()) => Ok(Synced { cart, error: None }),
            Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Cart mutation failed");
                Ok(Synced {
                    cart,
                    error: Some(e),
                })
            }
        }
    }
}

/// How long a pending marker is trusted.
fn stale_after(backend: &BackendClient) -> Duration {
    backend.timeout().saturating_mul(2)
}

/// Whether a cart mutation started within `stale_after` is still in flight
/// for this session.
pub async fn is_pending(session: &Session, stale_after: Duration) -> bool {
    session
        .get::<DateTime<Utc>>(session_keys::CART_PENDING)
        .await
        .ok()
        .flatten()
        .is_some_and(|started| still_pending(started, Utc::now(), stale_after))
}

fn still_pending(started: DateTime<Utc>, now: DateTime<Utc>, stale_after: Duration) -> bool {
    chrono::Duration::from_std(stale_after).is_ok_and(|window| now - started < window)
}
