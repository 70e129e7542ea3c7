//! Generic list, create, edit and delete handlers.
//!
//! One set of handlers serves every [`AdminResource`]; the router builders
//! at the bottom instantiate them per resource.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::components::{DataTable, FormField, FormValues};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Page;
use crate::resources::{AdminResource, EditableResource};
use crate::services::flash;
use crate::state::AppState;

/// List page for any resource.
#[derive(Template, WebTemplate)]
#[template(path = "resources/index.html")]
pub struct IndexTemplate {
    pub page: Page,
    pub title: &'static str,
    pub singular: &'static str,
    /// Dashboard path of the resource, e.g. `/products`.
    pub base: String,
    pub table: DataTable,
    pub editable: bool,
}

/// Create or edit form for any editable resource.
#[derive(Template, WebTemplate)]
#[template(path = "resources/form.html")]
pub struct FormTemplate {
    pub page: Page,
    pub heading: String,
    pub action: String,
    pub back: String,
    pub fields: Vec<FormField>,
    pub errors: Vec<String>,
}

fn base<R: AdminResource>() -> String {
    format!("/{}", R::PATH)
}

fn record_path<R: AdminResource>(id: R::Id) -> String {
    format!("/{}/{id}", R::PATH)
}

impl FormTemplate {
    fn for_new<R: EditableResource>(page: Page, values: &FormValues) -> Self {
        Self {
            page,
            heading: format!("New {}", R::SINGULAR.to_lowercase()),
            action: base::<R>(),
            back: base::<R>(),
            fields: R::fields(values),
            errors: Vec::new(),
        }
    }

    fn for_edit<R: EditableResource>(page: Page, id: R::Id, values: &FormValues) -> Self {
        Self {
            page,
            heading: format!("Edit {} #{id}", R::SINGULAR.to_lowercase()),
            action: record_path::<R>(id),
            back: base::<R>(),
            fields: R::fields(values),
            errors: Vec::new(),
        }
    }

    fn with_errors(mut self, errors: Vec<String>) -> Response {
        self.errors = errors;
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

/// Split a failed write into a message for the form or a hard error.
///
/// Validation failures (4xx from the backend) go back to the form; expired
/// sessions, missing records and server failures become [`AppError`].
fn form_rejection(err: ApiError) -> Result<String> {
    match err {
        ApiError::Backend { status, .. } if (400..500).contains(&status) => Ok(err.user_message()),
        other => Err(other.into()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /{resource}`
#[instrument(skip_all, fields(resource = R::PATH))]
pub async fn index<R: AdminResource>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: Page,
) -> Result<impl IntoResponse> {
    let records = state.backend().list::<R>(&admin.token).await?;

    Ok(IndexTemplate {
        page,
        title: R::PLURAL,
        singular: R::SINGULAR,
        base: base::<R>(),
        table: R::table(&records),
        editable: R::EDITABLE,
    })
}

/// `GET /{resource}/new`
pub async fn new<R: EditableResource>(
    RequireAdmin(_admin): RequireAdmin,
    page: Page,
) -> impl IntoResponse {
    FormTemplate::for_new::<R>(page, &FormValues::new())
}

/// `POST /{resource}`
#[instrument(skip_all, fields(resource = R::PATH, admin_id = %admin.id))]
pub async fn create<R: EditableResource>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(values): Form<FormValues>,
) -> Result<Response> {
    let input = match R::parse(&values) {
        Ok(input) => input,
        Err(errors) => {
            let page = Page::load(&session, &base::<R>()).await;
            return Ok(FormTemplate::for_new::<R>(page, &values).with_errors(errors));
        }
    };

    match state.backend().create::<R>(&admin.token, &input).await {
        Ok(record) => {
            tracing::info!(id = %R::id(&record), "Created");
            flash::success(&session, format!("{} created.", R::SINGULAR)).await?;
            Ok(Redirect::to(&base::<R>()).into_response())
        }
        Err(e) => {
            let message = form_rejection(e)?;
            let page = Page::load(&session, &base::<R>()).await;
            Ok(FormTemplate::for_new::<R>(page, &values).with_errors(vec![message]))
        }
    }
}

/// `GET /{resource}/{id}/edit`
pub async fn edit<R: EditableResource>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<R::Id>,
    page: Page,
) -> Result<impl IntoResponse> {
    let record = state.backend().fetch::<R>(&admin.token, id).await?;
    Ok(FormTemplate::for_edit::<R>(page, id, &R::values(&record)))
}

/// `POST /{resource}/{id}`
#[instrument(skip_all, fields(resource = R::PATH, id = %id, admin_id = %admin.id))]
pub async fn update<R: EditableResource>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<R::Id>,
    session: Session,
    Form(values): Form<FormValues>,
) -> Result<Response> {
    let input = match R::parse(&values) {
        Ok(input) => input,
        Err(errors) => {
            let page = Page::load(&session, &base::<R>()).await;
            return Ok(FormTemplate::for_edit::<R>(page, id, &values).with_errors(errors));
        }
    };

    match state.backend().update::<R>(&admin.token, id, &input).await {
        Ok(_) => {
            tracing::info!("Updated");
            flash::success(&session, format!("{} #{id} saved.", R::SINGULAR)).await?;
            Ok(Redirect::to(&base::<R>()).into_response())
        }
        Err(e) => {
            let message = form_rejection(e)?;
            let page = Page::load(&session, &base::<R>()).await;
            Ok(FormTemplate::for_edit::<R>(page, id, &values).with_errors(vec![message]))
        }
    }
}

/// `POST /{resource}/{id}/delete`
///
/// A record that is already gone still lands back on the list with a
/// notice rather than a 404.
#[instrument(skip_all, fields(resource = R::PATH, id = %id, admin_id = %admin.id))]
pub async fn delete<R: AdminResource>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<R::Id>,
    session: Session,
) -> Result<Redirect> {
    match state.backend().delete::<R>(&admin.token, id).await {
        Ok(()) => {
            tracing::info!("Deleted");
            flash::success(&session, format!("{} #{id} deleted.", R::SINGULAR)).await?;
        }
        Err(ApiError::Unauthorized) => return Err(AppError::Unauthorized),
        Err(e) if !e.is_server_error() => {
            flash::error(&session, e.user_message()).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(&base::<R>()))
}

// =============================================================================
// Router builders
// =============================================================================

/// List and delete only.
pub fn moderated<R: AdminResource>() -> Router<AppState> {
    Router::new()
        .route("/", get(index::<R>))
        .route("/{id}/delete", post(delete::<R>))
}

/// Full create, edit and delete.
pub fn editable<R: EditableResource>() -> Router<AppState> {
    Router::new()
        .route("/", get(index::<R>).post(create::<R>))
        .route("/new", get(new::<R>))
        .route("/{id}", post(update::<R>))
        .route("/{id}/edit", get(edit::<R>))
        .route("/{id}/delete", post(delete::<R>))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{CategoryId, Product, ProductId, Review};
    use rust_decimal::Decimal;

    use super::*;
    use crate::resources::{Categories, Products, Reviews};

    #[test]
    fn test_form_rejection_keeps_validation_messages() {
        let message = form_rejection(ApiError::Backend {
            status: 409,
            message: "slug already taken".to_string(),
        })
        .unwrap();
        assert_eq!(message, "slug already taken");

        assert!(matches!(
            form_rejection(ApiError::Unauthorized),
            Err(AppError::Api(ApiError::Unauthorized))
        ));
        assert!(form_rejection(ApiError::NotFound("/admin/products/9".to_string())).is_err());
    }

    #[test]
    fn test_index_renders_edit_and_delete_links() {
        let product = Product {
            id: ProductId::new(12),
            name: "Alphonso Mango Pulp".to_string(),
            slug: "alphonso-mango-pulp".to_string(),
            description: String::new(),
            price: bazaar_core::Money::inr(Decimal::new(250, 0)),
            stock: 40,
            category_id: Some(CategoryId::new(1)),
            images: Vec::new(),
            rating: 0.0,
            review_count: 0,
        };
        let html = IndexTemplate {
            page: Page::default(),
            title: Products::PLURAL,
            singular: Products::SINGULAR,
            base: base::<Products>(),
            table: Products::table(&[product]),
            editable: Products::EDITABLE,
        }
        .render()
        .unwrap();
        assert!(html.contains("Alphonso Mango Pulp"));
        assert!(html.contains("href=\"/products/12/edit\""));
        assert!(html.contains("action=\"/products/12/delete\""));
        assert!(html.contains("href=\"/products/new\""));
    }

    #[test]
    fn test_moderated_index_has_no_edit_links() {
        let html = IndexTemplate {
            page: Page::default(),
            title: Reviews::PLURAL,
            singular: Reviews::SINGULAR,
            base: base::<Reviews>(),
            table: Reviews::table(&Vec::<Review>::new()),
            editable: Reviews::EDITABLE,
        }
        .render()
        .unwrap();
        assert!(!html.contains("/reviews/new"));
        assert!(html.contains("No reviews yet"));
    }

    #[test]
    fn test_form_keeps_submitted_values_and_errors() {
        let values = FormValues::new().with("name", "Pickles").with("slug", "");
        let form =
            FormTemplate::for_edit::<Categories>(Page::default(), CategoryId::new(3), &values);
        assert_eq!(form.action, "/categories/3");

        let html = FormTemplate {
            errors: vec!["Slug must contain letters or digits.".to_string()],
            ..form
        }
        .render()
        .unwrap();
        assert!(html.contains("value=\"Pickles\""));
        assert!(html.contains("Slug must contain letters or digits."));
        assert!(html.contains("Edit category #3"));
    }
}
