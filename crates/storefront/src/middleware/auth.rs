//! Authentication extractors.
//!
//! Cart, checkout and account pages need a logged-in shopper because the
//! backend scopes those resources by token.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::LOGIN_PATH;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in shopper.
///
/// If nobody is logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.first_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for [`RequireAuth`].
pub enum AuthRejection {
    /// Nobody is logged in.
    RedirectToLogin,
    /// The session layer is missing from the stack.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToLogin)?;

        Ok(Self(user))
    }
}

/// Read the logged-in shopper from a session.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the logged-in shopper, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Forget everything in the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use bazaar_core::{Email, User, UserId, UserRole};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::api::AuthToken;

    fn parts_with(session: Option<Session>) -> Parts {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    fn shopper() -> CurrentUser {
        CurrentUser::new(
            User {
                id: UserId::new(12),
                name: "Kavya Menon".to_string(),
                email: Email::parse("kavya@example.in").unwrap(),
                role: UserRole::Customer,
            },
            AuthToken::new("tok-12".to_string()),
        )
    }

    #[tokio::test]
    async fn test_anonymous_redirects_to_login() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut parts = parts_with(Some(session));
        let rejection = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(rejection, Err(AuthRejection::RedirectToLogin)));
    }

    #[tokio::test]
    async fn test_missing_session_layer() {
        let mut parts = parts_with(None);
        let rejection = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(rejection, Err(AuthRejection::MissingSession)));
    }

    #[tokio::test]
    async fn test_logged_in_shopper_extracted() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_current_user(&session, &shopper()).await.unwrap();

        let mut parts = parts_with(Some(session.clone()));
        let Ok(RequireAuth(user)) = RequireAuth::from_request_parts(&mut parts, &()).await else {
            panic!("shopper should be extracted");
        };
        assert_eq!(user.id, UserId::new(12));
        assert_eq!(user.token.expose(), "tok-12");

        clear_current_user(&session).await.unwrap();
        assert!(current_user(&session).await.is_none());
    }
}
