//! REST backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for carts, addresses, orders and the
//!   catalog; nothing is persisted locally
//! - The shopper's backend token travels as a cookie on every call
//! - Product, category and banner reads are cached in memory via `moka`
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::api::BackendClient;
//!
//! let client = BackendClient::new(&config.backend, config.catalog_cache_ttl)?;
//!
//! let product = client.product(ProductId::new(7)).await?;
//! client.add_cart_item(&token, product.id, 2).await?;
//! let cart = client.cart(&token).await?;
//! ```

mod account;
mod cache;
mod catalog;
mod client;

pub use client::{AuthToken, BackendClient, LoginResponse};

use thiserror::Error;

/// Errors that can occur when talking to the REST backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built from the base URL.
    #[error("Invalid backend URL: {0}")]
    Url(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected (or did not receive) the shopper's token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },
}

impl ApiError {
    /// Message safe to show the shopper.
    ///
    /// Backend 4xx messages are shown as-is; everything else gets a generic
    /// notice so internal details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { status, message } if (400..500).contains(status) => message.clone(),
            Self::NotFound(_) => "That item could not be found.".to_string(),
            Self::Unauthorized => "Please log in to continue.".to_string(),
            Self::RateLimited(_) => "Too many requests, please wait a moment.".to_string(),
            _ => "Something went wrong talking to the store. Please try again.".to_string(),
        }
    }

    /// Whether this is a server-side failure worth reporting.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => true,
            Self::Backend { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Unauthorized | Self::RateLimited(_) => false,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks for a `message` or `error` string field, falling back to the
/// (truncated) raw body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(message) = value.get(field).and_then(serde_json::Value::as_str) {
                return message.to_string();
            }
        }
    }
    body.chars().take(200).collect()
}
