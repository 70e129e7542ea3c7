//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use bazaar_core::{Banner, Category, Product, active_banners};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::Page;
use crate::state::AppState;

/// Products shown in the home page grid.
const FEATURED_COUNT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: Page,
    pub banners: Vec<Banner>,
    pub categories: Vec<Category>,
    pub featured: Vec<Product>,
}

/// Display the home page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: Page) -> Result<impl IntoResponse> {
    let backend = state.backend();
    let (banners, categories, products) =
        tokio::try_join!(backend.banners(), backend.categories(), backend.products(None, None))?;

    let featured = products.into_iter().take(FEATURED_COUNT).collect();

    Ok(HomeTemplate {
        page,
        banners: active_banners(banners),
        categories,
        featured,
    })
}
