//! Catalog route handlers: product listing, detail, reviews and categories.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{Category, CategoryId, Product, ProductId, Review, ReviewInput};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Page;
use crate::services::flash;
use crate::state::AppState;

use super::empty_string_as_none;

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<CategoryId>,
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    pub comment: String,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: Page,
    pub heading: String,
    pub products: Vec<Product>,
    pub categories: Vec<CategoryOption>,
    pub query: String,
}

/// A category in the filter list.
pub struct CategoryOption {
    pub category: Category,
    pub selected: bool,
}

fn category_options(
    categories: Vec<Category>,
    selected: Option<CategoryId>,
) -> Vec<CategoryOption> {
    categories
        .into_iter()
        .map(|category| CategoryOption {
            selected: selected == Some(category.id),
            category,
        })
        .collect()
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: Page,
    pub product: Product,
    pub category: Option<Category>,
    pub reviews: Vec<Review>,
}

/// Map a backend 404 to a page-level not found.
fn not_found(what: String) -> impl FnOnce(ApiError) -> AppError {
    move |err| match err {
        ApiError::NotFound(_) => AppError::NotFound(what),
        other => other.into(),
    }
}

/// Display product listing page.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
    page: Page,
) -> Result<impl IntoResponse> {
    let backend = state.backend();
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let (products, categories) = tokio::try_join!(
        backend.products(search, query.category),
        backend.categories()
    )?;

    let heading = match search {
        Some(q) => format!("Results for \u{201c}{q}\u{201d}"),
        None => "All products".to_string(),
    };

    Ok(ProductsIndexTemplate {
        page,
        heading,
        products,
        categories: category_options(categories, query.category),
        query: search.unwrap_or_default().to_string(),
    })
}

/// Display one category's products.
#[instrument(skip(state, page), fields(category_id = %id))]
pub async fn category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    page: Page,
) -> Result<impl IntoResponse> {
    let backend = state.backend();
    let (products, categories) =
        tokio::try_join!(backend.products(None, Some(id)), backend.categories())?;

    let heading = categories
        .iter()
        .find(|category| category.id == id)
        .map(|category| category.name.clone())
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    Ok(ProductsIndexTemplate {
        page,
        heading,
        products,
        categories: category_options(categories, Some(id)),
        query: String::new(),
    })
}

/// Display product detail page with its reviews.
#[instrument(skip(state, page), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    page: Page,
) -> Result<impl IntoResponse> {
    let backend = state.backend();
    let (product, reviews, categories) = tokio::try_join!(
        backend.product(id),
        backend.reviews(id),
        backend.categories()
    )
    .map_err(not_found(format!("product {id}")))?;

    let category = product
        .category_id
        .and_then(|category_id| categories.into_iter().find(|c| c.id == category_id));

    Ok(ProductShowTemplate {
        page,
        product,
        category,
        reviews,
    })
}

/// Post a review, then return to the product page.
///
/// Validation failures and backend rejections come back as flash messages.
#[instrument(skip(state, session, user, form), fields(product_id = %id))]
pub async fn create_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let back = Redirect::to(&format!("/products/{id}")).into_response();

    let review = match ReviewInput::validated(form.rating, &form.comment) {
        Ok(review) => review,
        Err(message) => {
            flash::error(&session, message).await?;
            return Ok(back);
        }
    };

    match state.backend().post_review(&user.token, id, &review).await {
        Ok(_) => flash::success(&session, "Thanks for your review!").await?,
        Err(ApiError::Unauthorized) => return Err(AppError::Unauthorized),
        Err(e) => flash::error(&session, e.user_message()).await?,
    }

    Ok(back)
}
