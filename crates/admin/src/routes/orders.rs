//! Order list, detail and status route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use bazaar_core::{Money, OrderId, OrderRecord, OrderStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::components::DataTable;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Page;
use crate::resources::{AdminResource, Orders};
use crate::services::flash;
use crate::state::AppState;

/// `?status=` filter on the order list.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    /// The requested status; blank means all.
    fn status(&self) -> Result<Option<OrderStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(AppError::BadRequest),
        }
    }
}

/// Status update form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// One option in a status picker.
#[derive(Debug, Clone)]
pub struct StatusChoice {
    pub value: &'static str,
    pub selected: bool,
}

fn status_choices(current: Option<OrderStatus>) -> Vec<StatusChoice> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusChoice {
            value: status.as_str(),
            selected: Some(status) == current,
        })
        .collect()
}

/// Order line for the detail page.
#[derive(Debug, Clone)]
pub struct LineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total: Money,
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: Page,
    pub table: DataTable,
    pub statuses: Vec<StatusChoice>,
    pub filtered: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: Page,
    pub order: OrderRecord,
    pub lines: Vec<LineView>,
    pub statuses: Vec<StatusChoice>,
}

impl OrderShowTemplate {
    fn new(page: Page, order: OrderRecord) -> Self {
        let lines = order
            .items
            .iter()
            .map(|item| LineView {
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.unit_price * item.quantity,
            })
            .collect();
        Self {
            page,
            statuses: status_choices(Some(order.status)),
            lines,
            order,
        }
    }
}

/// Orders newest first, optionally narrowed to one status.
fn visible_orders(mut orders: Vec<OrderRecord>, status: Option<OrderStatus>) -> Vec<OrderRecord> {
    if let Some(status) = status {
        orders.retain(|order| order.status == status);
    }
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

/// `GET /orders`
#[instrument(skip(state, admin, page))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<StatusQuery>,
    page: Page,
) -> Result<impl IntoResponse> {
    let status = query.status()?;
    let orders = state.backend().list::<Orders>(&admin.token).await?;

    Ok(OrdersIndexTemplate {
        page,
        table: Orders::table(&visible_orders(orders, status)),
        statuses: status_choices(status),
        filtered: status.is_some(),
    })
}

/// `GET /orders/{id}`
#[instrument(skip(state, admin, page))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    page: Page,
) -> Result<impl IntoResponse> {
    let order = state.backend().fetch::<Orders>(&admin.token, id).await?;
    Ok(OrderShowTemplate::new(page, order))
}

/// `POST /orders/{id}/status`
#[instrument(skip(state, admin, session), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    session: Session,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status: OrderStatus = form.status.trim().parse().map_err(AppError::BadRequest)?;

    match state
        .backend()
        .update_order_status(&admin.token, id, status)
        .await
    {
        Ok(order) => {
            tracing::info!(status = %order.status, "Order status updated");
            flash::success(&session, format!("Order #{id} marked {}.", order.status)).await?;
        }
        Err(e @ ApiError::Backend { status, .. }) if (400..500).contains(&status) => {
            flash::error(&session, e.user_message()).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&format!("/orders/{id}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{AddressInput, OrderLine, OrderSummary, PaymentMethod, ProductId};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn order(id: i64, status: OrderStatus, day: u32) -> OrderRecord {
        let price = Money::inr(Decimal::new(120, 0));
        OrderRecord {
            id: OrderId::new(id),
            items: vec![OrderLine {
                product_id: ProductId::new(2),
                name: "Ragi Flour 1kg".to_string(),
                quantity: 3,
                unit_price: price,
            }],
            shipping_address: AddressInput {
                first_name: "Farah".to_string(),
                last_name: "Khan".to_string(),
                city: "Pune".to_string(),
                ..AddressInput::default()
            },
            payment_method: PaymentMethod::CashOnDelivery,
            status,
            summary: OrderSummary {
                item_count: 3,
                subtotal: price * 3,
                shipping_fee: Money::inr(Decimal::new(40, 0)),
                cod_fee: Money::inr(Decimal::new(50, 0)),
                total: Money::inr(Decimal::new(450, 0)),
            },
            created_at: Utc.with_ymd_and_hms(2026, 9, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_status_query() {
        let query = StatusQuery {
            status: Some(" shipped ".to_string()),
        };
        assert_eq!(query.status().unwrap(), Some(OrderStatus::Shipped));
        assert_eq!(StatusQuery { status: Some(String::new()) }.status().unwrap(), None);
        assert!(matches!(
            StatusQuery { status: Some("lost".to_string()) }.status(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_visible_orders_filters_and_sorts() {
        let orders = vec![
            order(1, OrderStatus::Pending, 1),
            order(2, OrderStatus::Shipped, 3),
            order(3, OrderStatus::Pending, 5),
        ];
        let ids: Vec<i64> = visible_orders(orders.clone(), None)
            .iter()
            .map(|o| o.id.as_i64())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let pending = visible_orders(orders, Some(OrderStatus::Pending));
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|o| o.status == OrderStatus::Pending));
    }

    #[test]
    fn test_detail_page_preselects_current_status() {
        let html = OrderShowTemplate::new(Page::default(), order(77, OrderStatus::Processing, 2))
            .render()
            .unwrap();
        assert!(html.contains("Order #77"));
        assert!(html.contains("Farah Khan"));
        assert!(html.contains("₹360.00"));
        assert!(html.contains("₹450.00"));
        assert!(html.contains("<option value=\"processing\" selected>"));
        assert!(html.contains("action=\"/orders/77/status\""));
    }

    #[test]
    fn test_index_links_to_detail() {
        let orders = vec![order(5, OrderStatus::Delivered, 4)];
        let html = OrdersIndexTemplate {
            page: Page::default(),
            table: Orders::table(&orders),
            statuses: status_choices(None),
            filtered: false,
        }
        .render()
        .unwrap();
        assert!(html.contains("href=\"/orders/5\""));
        assert!(html.contains("delivered"));
        assert!(!html.contains("/orders/5/delete"));
    }
}
