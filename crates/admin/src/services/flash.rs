//! Flash messages.
//!
//! Every admin write ends in a redirect; the flash queued before it is shown
//! on the page the redirect lands on.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash--success",
            Self::Error => "flash--error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

async fn push(
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

/// Remove and return every queued message.
pub async fn take(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flashes_are_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        success(&session, "Product created.").await.unwrap();
        error(&session, "Slug already taken").await.unwrap();

        let shown = take(&session).await;
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].kind, FlashKind::Success);
        assert_eq!(shown[1].message, "Slug already taken");
        assert!(take(&session).await.is_empty());
    }
}
