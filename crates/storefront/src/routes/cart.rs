//! Cart route handlers.
//!
//! Every mutation goes through [`CartSync`]: one backend call, then a full
//! refetch, and the page is rendered from the refetched cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use bazaar_core::{Cart, CartItemId, Money, OrderSummary, ProductId, SummaryRules};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Page;
use crate::services::{CartSync, Synced, flash};
use crate::state::AppState;

use super::empty_string_as_none;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<i64>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: CartItemId,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: Page,
    pub cart: Cart,
    pub summary: OrderSummary,
    /// How much more to spend for free shipping, if anything.
    pub free_shipping_gap: Option<Money>,
}

impl CartShowTemplate {
    fn new(page: Page, cart: Cart, rules: &SummaryRules) -> Self {
        let summary = OrderSummary::for_items(&cart.items, None, rules);
        let free_shipping_gap = (!cart.is_empty() && !summary.free_shipping()).then(|| {
            Money::new(
                rules.free_shipping_threshold - summary.subtotal.amount,
                summary.subtotal.currency,
            )
        });

        Self {
            page,
            cart,
            summary,
            free_shipping_gap,
        }
    }
}

/// Reject quantities below 1 before anything reaches the backend.
pub(crate) fn positive_quantity(quantity: i64) -> Result<u32> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| AppError::BadRequest("quantity must be at least 1".to_string()))
}

/// Flash the mutation outcome and render the refetched cart.
async fn render_synced(
    state: &AppState,
    session: &Session,
    synced: Synced,
    success: &str,
) -> Result<Response> {
    match &synced.error {
        None => flash::success(session, success).await?,
        Some(e) => flash::error(session, e.user_message()).await?,
    }

    let page = Page::load(session).await;
    Ok(CartShowTemplate::new(page, synced.cart, state.summary_rules()).into_response())
}

/// Display cart page.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let cart = CartSync::new(state.backend(), &session, &user.token)
        .fetch()
        .await?;
    let page = Page::load(&session).await;
    Ok(CartShowTemplate::new(page, cart, state.summary_rules()).into_response())
}

/// Add a product to the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = positive_quantity(form.quantity.unwrap_or(1))?;
    let backend = state.backend();

    let synced = CartSync::new(backend, &session, &user.token)
        .apply(backend.add_cart_item(&user.token, form.product_id, quantity))
        .await?;

    render_synced(&state, &session, synced, "Added to cart").await
}

/// Change a line's quantity.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let quantity = positive_quantity(form.quantity)?;
    let backend = state.backend();

    let synced = CartSync::new(backend, &session, &user.token)
        .apply(backend.update_cart_item(&user.token, form.item_id, quantity))
        .await?;

    render_synced(&state, &session, synced, "Cart updated").await
}

/// Remove a line from the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let backend = state.backend();

    let synced = CartSync::new(backend, &session, &user.token)
        .apply(backend.remove_cart_item(&user.token, form.item_id))
        .await?;

    render_synced(&state, &session, synced, "Item removed").await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{CartItem, ProductRef};
    use rust_decimal::Decimal;

    use super::*;

    fn cart(price: i64) -> Cart {
        Cart::new(vec![CartItem {
            id: CartItemId::new(1),
            product: ProductRef {
                id: ProductId::new(10),
                name: "Masala Chai".to_string(),
                image_url: None,
            },
            quantity: 1,
            unit_price: Money::inr(Decimal::new(price, 0)),
        }])
    }

    #[test]
    fn test_positive_quantity() {
        assert_eq!(positive_quantity(3).unwrap(), 3);
        assert!(matches!(positive_quantity(0), Err(AppError::BadRequest(_))));
        assert!(matches!(positive_quantity(-2), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_free_shipping_gap() {
        let rules = SummaryRules::default();
        let template = CartShowTemplate::new(Page::default(), cart(420), &rules);
        assert_eq!(
            template.free_shipping_gap,
            Some(Money::inr(Decimal::new(80, 0)))
        );

        let template = CartShowTemplate::new(Page::default(), cart(900), &rules);
        assert!(template.free_shipping_gap.is_none());
    }

    #[test]
    fn test_renders_lines_and_total() {
        let html = CartShowTemplate::new(Page::default(), cart(120), &SummaryRules::default())
            .render()
            .unwrap();
        assert!(html.contains("Masala Chai"));
        assert!(html.contains("₹160.00"));
    }

    #[test]
    fn test_renders_empty_cart() {
        let html = CartShowTemplate::new(Page::default(), Cart::default(), &SummaryRules::default())
            .render()
            .unwrap();
        assert!(html.contains("Your cart is empty"));
        assert!(!html.contains("action=\"/checkout\""));
    }
}
