//! Authentication route handlers for admin.
//!
//! The dashboard signs in against the same backend as the storefront. Any
//! account may sign in; only admins get past [`RequireAdmin`].
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{LOGIN_PATH, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::current_admin;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Page};
use crate::services::flash;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password.";

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub email: String,
    pub error: Option<String>,
}

/// `GET /login`
pub async fn login_page(page: Page) -> impl IntoResponse {
    LoginTemplate {
        page,
        email: String::new(),
        error: None,
    }
}

async fn retry(session: &Session, email: String, error: &str) -> Response {
    LoginTemplate {
        page: Page::load(session, LOGIN_PATH).await,
        email,
        error: Some(error.to_string()),
    }
    .into_response()
}

/// `POST /login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(retry(&session, form.email, BAD_CREDENTIALS).await);
    };
    if form.password.is_empty() {
        return Ok(retry(&session, form.email, BAD_CREDENTIALS).await);
    }

    match state.backend().login(&email, &form.password).await {
        Ok(login) => {
            let admin = CurrentAdmin::new(login.user, login.token);
            set_current_admin(&session, &admin).await?;
            set_sentry_user(&admin.id, Some(admin.email.as_str()));

            if admin.is_admin() {
                tracing::info!(admin_id = %admin.id, "Admin logged in");
                flash::success(&session, format!("Signed in as {}.", admin.name)).await?;
            } else {
                tracing::warn!(
                    user_id = %admin.id,
                    role = ?admin.role,
                    "Non-admin signed in to dashboard"
                );
            }
            Ok(Redirect::to("/").into_response())
        }
        Err(ApiError::Unauthorized) => {
            tracing::info!("Login rejected");
            Ok(retry(&session, form.email, BAD_CREDENTIALS).await)
        }
        Err(e @ ApiError::Backend { status, .. }) if (400..500).contains(&status) => {
            Ok(retry(&session, form.email, &e.user_message()).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /logout`
///
/// The local session is cleared even if the backend call fails.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    if let Some(admin) = current_admin(&session).await {
        if let Err(e) = state.backend().logout(&admin.token).await {
            tracing::warn!(error = %e, "Backend logout failed");
        }
    }

    clear_current_admin(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to(LOGIN_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_keeps_email() {
        let html = LoginTemplate {
            page: Page::default(),
            email: "ops@bazaar.in".to_string(),
            error: Some(BAD_CREDENTIALS.to_string()),
        }
        .render()
        .unwrap();
        assert!(html.contains("value=\"ops@bazaar.in\""));
        assert!(html.contains(BAD_CREDENTIALS));
        assert!(html.contains("action=\"/login\""));
    }
}
