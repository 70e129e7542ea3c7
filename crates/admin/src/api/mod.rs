//! REST backend client for the admin dashboard.
//!
//! # Architecture
//!
//! - Every call carries the dashboard's `X-Admin-Key` plus the signed-in
//!   admin's backend token as a cookie
//! - Catalog and order endpoints live under `/admin/...` on the backend and
//!   are addressed generically through [`crate::resources::AdminResource`]
//! - Nothing is cached: admins expect to see their own writes immediately
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_admin::api::BackendClient;
//! use bazaar_admin::resources::Products;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! let products = client.list::<Products>(&token).await?;
//! client.delete::<Products>(&token, products[0].id).await?;
//! ```

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

    /// The backend rejected (or did not receive) the admin's token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The token is valid but lacks admin rights, or the API key was refused.
    #[error("Forbidden")]
    Forbidden,

    /// Any other non-success status.
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },
}

impl ApiError {
    /// Message safe to show in a flash.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { status, message } if (400..500).contains(status) => message.clone(),
            Self::NotFound(_) => "That record no longer exists.".to_string(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::Forbidden => "The backend refused this admin action.".to_string(),
            _ => "The backend could not be reached. Please try again.".to_string(),
        }
    }

    /// Whether this is a server-side failure worth reporting.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => true,
            Self::Backend { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Unauthorized | Self::Forbidden => false,
        }
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(message) = value.get(field).and_then(serde_json::Value::as_str) {
                return message.to_string();
            }
        }
    }
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_reads_json() {
        assert_eq!(
            error_message(r#"{"error": "slug already taken"}"#),
            "slug already taken"
        );
        assert_eq!(error_message("not json"), "not json");
    }

    #[test]
    fn test_validation_errors_reach_the_admin() {
        let err = ApiError::Backend {
            status: 422,
            message: "slug already taken".to_string(),
        };
        assert_eq!(err.user_message(), "slug already taken");
        assert!(!err.is_server_error());
        assert!(!ApiError::Forbidden.is_server_error());
    }
}
