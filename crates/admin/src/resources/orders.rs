use bazaar_core::{OrderId, OrderRecord};

use super::AdminResource;

/// Orders at `/admin/orders`.
///
/// Orders are created by shoppers at checkout. The dashboard only reads
/// them and moves them through their status lifecycle.
pub struct Orders;

impl AdminResource for Orders {
    type Id = OrderId;
    type Record = OrderRecord;

    const PATH: &'static str = "orders";
    const SINGULAR: &'static str = "Order";
    const PLURAL: &'static str = "Orders";
    const COLUMNS: &'static [&'static str] =
        &["Order", "Placed", "Customer", "Items", "Total", "Payment", "Status"];

    fn id(record: &OrderRecord) -> OrderId {
        record.id
    }

    fn cells(record: &OrderRecord) -> Vec<String> {
        vec![
            format!("#{}", record.id),
            record.created_at.format("%d %b %Y %H:%M").to_string(),
            record.shipping_address.full_name(),
            record.summary.item_count.to_string(),
            record.summary.total.to_string(),
            record.payment_method.describe(),
            record.status.to_string(),
        ]
    }
}
