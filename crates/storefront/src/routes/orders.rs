//! Order history route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use bazaar_core::OrderRecord;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Page;
use crate::state::AppState;

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub page: Page,
    pub orders: Vec<OrderRecord>,
}

/// Display the shopper's orders, newest first.
#[instrument(skip(state, page, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: Page,
) -> Result<impl IntoResponse> {
    let mut orders = state.backend().orders(&user.token).await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(OrdersTemplate { page, orders })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{
        AddressInput, Money, OrderId, OrderLine, OrderStatus, OrderSummary, PaymentMethod,
        ProductId,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_renders_order_rows() {
        let price = Money::inr(Decimal::new(250, 0));
        let order = OrderRecord {
            id: OrderId::new(88),
            items: vec![OrderLine {
                product_id: ProductId::new(1),
                name: "Nilgiri Green".to_string(),
                quantity: 2,
                unit_price: price,
            }],
            shipping_address: AddressInput::default(),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Shipped,
            summary: OrderSummary {
                item_count: 2,
                subtotal: price * 2,
                shipping_fee: Money::inr(Decimal::ZERO),
                cod_fee: Money::inr(Decimal::new(50, 0)),
                total: Money::inr(Decimal::new(550, 0)),
            },
            created_at: Utc.with_ymd_and_hms(2026, 9, 30, 10, 0, 0).unwrap(),
        };

        let html = OrdersTemplate {
            page: Page::default(),
            orders: vec![order],
        }
        .render()
        .unwrap();
        assert!(html.contains("#88"));
        assert!(html.contains("shipped"));
        assert!(html.contains("₹550.00"));
        assert!(html.contains("Cash on Delivery"));
    }

    #[test]
    fn test_renders_empty_history() {
        let html = OrdersTemplate {
            page: Page::default(),
            orders: Vec::new(),
        }
        .render()
        .unwrap();
        assert!(html.contains("No orders yet"));
    }
}
