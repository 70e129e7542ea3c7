//! Per-page layout data.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::auth::current_user;
use crate::models::CurrentUser;
use crate::services::flash::{self, Flash};

/// What the base layout needs on every page: who is logged in and which
/// flash messages to show.
///
/// Extracting it drains the flash queue, so only handlers that render a
/// page should ask for it. Handlers that may redirect call [`Page::load`]
/// once they know they are rendering.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
}

impl Page {
    /// Build the layout data from the session.
    pub async fn load(session: &Session) -> Self {
        Self {
            user: current_user(session).await,
            flashes: flash::take(session).await,
        }
    }

    /// Greeting name for the header.
    #[must_use]
    pub fn greeting(&self) -> Option<&str> {
        self.user.as_ref().map(CurrentUser::first_name)
    }
}

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match parts.extensions.get::<Session>() {
            Some(session) => Self::load(session).await,
            None => Self::default(),
        })
    }
}
