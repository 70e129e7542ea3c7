//! Authentication route handlers.
//!
//! Credentials go straight to the REST backend. The token it returns is kept
//! in the server session and never reaches the browser.

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
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::current_user;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, Page};
use crate::services::flash;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub email: String,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(page: Page) -> impl IntoResponse {
    LoginTemplate {
        page,
        email: String::new(),
        error: None,
    }
}

/// Re-render the login form with an error, keeping the typed email.
async fn retry(session: &Session, email: String, error: &str) -> Response {
    LoginTemplate {
        page: Page::load(session).await,
        email,
        error: Some(error.to_string()),
    }
    .into_response()
}

/// Handle login form submission.
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
            let user = CurrentUser::new(login.user, login.token);
            set_current_user(&session, &user).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "Shopper logged in");

            flash::success(&session, format!("Welcome back, {}!", user.first_name())).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(ApiError::Unauthorized) => {
            tracing::info!("Login rejected");
            Ok(retry(&session, form.email, BAD_CREDENTIALS).await)
        }
        Err(e @ ApiError::Backend { status, .. }) if (400..500).contains(&status) => {
            Ok(retry(&session, form.email, &e.user_message()).await)
        }
        Err(e) => Err(AppError::Api(e)),
    }
}

/// Handle logout.
///
/// The local session is cleared even if the backend call fails.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    if let Some(user) = current_user(&session).await {
        if let Err(e) = state.backend().logout(&user.token).await {
            tracing::warn!(error = %e, "Backend logout failed");
        }
    }

    clear_current_user(&session).await?;
    clear_sentry_user();
    flash::success(&session, "You have been logged out.").await?;

    Ok(Redirect::to("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_keeps_email() {
        let html = LoginTemplate {
            page: Page::default(),
            email: "asha@example.in".to_string(),
            error: Some(BAD_CREDENTIALS.to_string()),
        }
        .render()
        .unwrap();
        assert!(html.contains("value=\"asha@example.in\""));
        assert!(html.contains(BAD_CREDENTIALS));
        assert!(html.contains("action=\"/auth/login\""));
    }
}
