//! Flash messages.
//!
//! Queued in the session by one request and removed by the next page that
//! renders them.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::AppError;
use crate::models::session_keys;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

impl FlashKind {
    /// CSS modifier used by the base template.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash--success",
            Self::Info => "flash--info",
            Self::Error => "flash--error",
        }
    }
}

/// A queued notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Queue a flash message.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn push(
    session: &Session,
    kind: FlashKind,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut queued: Vec<Flash> = session.get(session_keys::FLASH).await?.unwrap_or_default();
    queued.push(Flash {
        kind,
        message: message.into(),
    });
    session.insert(session_keys::FLASH, queued).await
}

/// Queue a success notice.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn success(
    session: &Session,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, FlashKind::Success, message).await
}

/// Queue an error notice.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn error(
    session: &Session,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, FlashKind::Error, message).await
}

/// Flash the outcome of a backend call.
///
/// Success queues `success`; a failure queues the backend's user-facing
/// message and yields `None`. An expired token is not flashed but returned,
/// so the handler redirects to login.
///
/// # Errors
///
/// Returns an error on [`ApiError::Unauthorized`] or if the session cannot
/// be modified.
pub async fn outcome<T>(
    session: &Session,
    result: Result<T, ApiError>,
    success_message: &str,
) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => {
            success(session, success_message).await?;
            Ok(Some(value))
        }
        Err(ApiError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => {
            error(session, e.user_message()).await?;
            Ok(None)
        }
    }
}

/// Remove and return every queued message.
///
/// Session failures yield no messages rather than breaking the page.
pub async fn take(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
