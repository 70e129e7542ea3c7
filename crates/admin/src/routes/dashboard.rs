//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use bazaar_core::{Money, OrderRecord, OrderStatus, Product};
use tracing::instrument;

use crate::{
    error::Result,
    filters,
    middleware::RequireAdmin,
    models::Page,
    resources::{Orders, Products, Reviews},
    state::AppState,
};

/// Products at or below this stock level are flagged.
const LOW_STOCK: u32 = 5;
const RECENT_ORDERS: usize = 5;

/// Headline numbers.
#[derive(Debug, Clone, Default)]
pub struct DashboardMetrics {
    pub products: usize,
    pub orders: usize,
    pub reviews: usize,
    /// Total of every order that was not cancelled.
    pub revenue: Money,
}

/// Number of orders in one status.
#[derive(Debug, Clone)]
pub struct StatusCount {
    pub status: &'static str,
    pub count: usize,
}

/// Recent order view for dashboard.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub id: String,
    pub customer_name: String,
    pub total: String,
    pub status: String,
}

impl From<&OrderRecord> for RecentOrderView {
    fn from(order: &OrderRecord) -> Self {
        Self {
            id: order.id.to_string(),
            customer_name: order.shipping_address.full_name(),
            total: order.summary.total.to_string(),
            status: order.status.to_string(),
        }
    }
}

/// Product running out of stock.
#[derive(Debug, Clone)]
pub struct LowStockView {
    pub id: String,
    pub name: String,
    pub stock: u32,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: Page,
    pub metrics: DashboardMetrics,
    pub status_counts: Vec<StatusCount>,
    pub recent_orders: Vec<RecentOrderView>,
    pub low_stock: Vec<LowStockView>,
}

impl DashboardTemplate {
    fn build(
        page: Page,
        products: &[Product],
        mut orders: Vec<OrderRecord>,
        reviews: usize,
    ) -> Self {
        let revenue = orders
            .iter()
            .filter(|order| order.status != OrderStatus::Cancelled)
            .map(|order| order.summary.total)
            .sum();

        let status_counts = OrderStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status: status.as_str(),
                count: orders.iter().filter(|order| order.status == status).count(),
            })
            .collect();

        let mut low_stock: Vec<LowStockView> = products
            .iter()
            .filter(|product| product.stock <= LOW_STOCK)
            .map(|product| LowStockView {
                id: product.id.to_string(),
                name: product.name.clone(),
                stock: product.stock,
            })
            .collect();
        low_stock.sort_by_key(|product| product.stock);

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            page,
            metrics: DashboardMetrics {
                products: products.len(),
                orders: orders.len(),
                reviews,
                revenue,
            },
            status_counts,
            recent_orders: orders.iter().take(RECENT_ORDERS).map(RecentOrderView::from).collect(),
            low_stock,
        }
    }
}

/// `GET /`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: Page,
) -> Result<impl IntoResponse> {
    let backend = state.backend();
    let (products, orders, reviews) = tokio::try_join!(
        backend.list::<Products>(&admin.token),
        backend.list::<Orders>(&admin.token),
        backend.list::<Reviews>(&admin.token),
    )?;

    Ok(DashboardTemplate::build(page, &products, orders, reviews.len()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{
        AddressInput, OrderId, OrderSummary, PaymentMethod, ProductId,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn rupees(amount: i64) -> Money {
        Money::inr(Decimal::new(amount, 0))
    }

    fn product(id: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            description: String::new(),
            price: rupees(100),
            stock,
            category_id: None,
            images: Vec::new(),
            rating: 0.0,
            review_count: 0,
        }
    }

    fn order(id: i64, status: OrderStatus, total: i64, hour: u32) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(id),
            items: Vec::new(),
            shipping_address: AddressInput {
                first_name: "Meera".to_string(),
                last_name: "Iyer".to_string(),
                ..AddressInput::default()
            },
            payment_method: PaymentMethod::CashOnDelivery,
            status,
            summary: OrderSummary {
                item_count: 1,
                subtotal: rupees(total),
                shipping_fee: Money::default(),
                cod_fee: Money::default(),
                total: rupees(total),
            },
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_revenue_skips_cancelled_orders() {
        let orders = vec![
            order(1, OrderStatus::Delivered, 600, 8),
            order(2, OrderStatus::Cancelled, 900, 9),
            order(3, OrderStatus::Pending, 150, 10),
        ];
        let dashboard = DashboardTemplate::build(Page::default(), &[], orders, 0);
        assert_eq!(dashboard.metrics.revenue, rupees(750));
        assert_eq!(dashboard.metrics.orders, 3);

        let cancelled = dashboard
            .status_counts
            .iter()
            .find(|count| count.status == "cancelled")
            .unwrap();
        assert_eq!(cancelled.count, 1);
    }

    #[test]
    fn test_recent_orders_newest_first_and_capped() {
        let orders = (1..=7)
            .map(|i| order(i, OrderStatus::Pending, 100, u32::try_from(i).unwrap()))
            .collect();
        let dashboard = DashboardTemplate::build(Page::default(), &[], orders, 0);
        let ids: Vec<&str> = dashboard.recent_orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "6", "5", "4", "3"]);
    }

    #[test]
    fn test_low_stock_sorted_by_stock() {
        let products = [product(1, 50), product(2, 5), product(3, 0), product(4, 6)];
        let dashboard = DashboardTemplate::build(Page::default(), &products, Vec::new(), 2);
        let names: Vec<&str> = dashboard.low_stock.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Product 3", "Product 2"]);
        assert_eq!(dashboard.metrics.reviews, 2);

        let html = dashboard.render().unwrap();
        assert!(html.contains("href=\"/products/3/edit\""));
    }
}
