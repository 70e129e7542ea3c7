//! Authentication middleware and extractors for admin.
//!
//! Provides the extractor every dashboard page uses to require a signed-in
//! backend user with the admin role.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::LOGIN_PATH;
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires admin authentication.
///
/// - Nobody signed in: redirect to the login page.
/// - Signed in without the admin role: 403 Forbidden.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when admin authentication is required.
pub enum AdminRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Signed in, but not an admin.
    Forbidden(String),
    /// The session layer is missing from the stack.
    MissingSession,
}

/// Page shown to signed-in users without the admin role.
#[derive(Template, WebTemplate)]
#[template(path = "forbidden.html")]
pub struct ForbiddenTemplate {
    pub name: String,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Forbidden(name) => {
                (StatusCode::FORBIDDEN, ForbiddenTemplate { name }).into_response()
            }
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminRejection::MissingSession)?;

        let admin = current_admin(session)
            .await
            .ok_or(AdminRejection::RedirectToLogin)?;

        if !admin.is_admin() {
            tracing::warn!(user_id = %admin.id, path = %parts.uri.path(), "Non-admin refused");
            return Err(AdminRejection::Forbidden(admin.name));
        }

        Ok(Self(admin))
    }
}

/// Read the signed-in user from a session.
pub async fn current_admin(session: &Session) -> Option<CurrentAdmin> {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in user, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Forget everything in the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
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

    fn parts_with(session: Session) -> Parts {
        let (mut parts, ()) = Request::builder()
            .uri("/products")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session);
        parts
    }

    fn user(role: UserRole) -> CurrentAdmin {
        CurrentAdmin::new(
            User {
                id: UserId::new(1),
                name: "Ravi Iyer".to_string(),
                email: Email::parse("ravi@bazaar.in").unwrap(),
                role,
            },
            AuthToken::new("tok".to_string()),
        )
    }

    async fn extract(session: &Session) -> Result<RequireAdmin, AdminRejection> {
        let mut parts = parts_with(session.clone());
        RequireAdmin::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_anonymous_redirects_to_login() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(matches!(
            extract(&session).await,
            Err(AdminRejection::RedirectToLogin)
        ));
    }

    #[tokio::test]
    async fn test_customer_is_forbidden() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_current_admin(&session, &user(UserRole::Customer))
            .await
            .unwrap();

        let Err(rejection) = extract(&session).await else {
            panic!("customers must not reach admin pages");
        };
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_is_extracted() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_current_admin(&session, &user(UserRole::Admin))
            .await
            .unwrap();

        let Ok(RequireAdmin(admin)) = extract(&session).await else {
            panic!("admin should be extracted");
        };
        assert_eq!(admin.email.as_str(), "ravi@bazaar.in");

        clear_current_admin(&session).await.unwrap();
        assert!(current_admin(&session).await.is_none());
    }
}
