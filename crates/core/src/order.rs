//! Order payloads and records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::AddressInput;
use crate::payment::PaymentMethod;
use crate::summary::OrderSummary;
use crate::types::{CartItemId, Money, OrderId, OrderStatus, ProductId};

/// Where the ordered items come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OrderSource {
    /// The listed cart lines.
    Cart { items: Vec<CartItemId> },
    /// A single product bypassing the cart.
    BuyNow {
        product_id: ProductId,
        quantity: u32,
    },
}

/// Payload for `POST /orders`. Sent once; never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(flatten)]
    pub source: OrderSource,
    pub shipping_address: AddressInput,
    pub payment_method: PaymentMethod,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// An order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub items: Vec<OrderLine>,
    pub shipping_address: AddressInput,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    pub summary: OrderSummary,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::address::tests::sample_input;

    #[test]
    fn test_buy_now_request_wire_format() {
        let request = OrderRequest {
            source: OrderSource::BuyNow {
                product_id: ProductId::new(9),
                quantity: 2,
            },
            shipping_address: sample_input(),
            payment_method: PaymentMethod::CashOnDelivery,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["source"], "buy_now");
        assert_eq!(json["product_id"], 9);
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["payment_method"]["type"], "cod");
        assert_eq!(json["shipping_address"]["city"], "Bengaluru");
    }

    #[test]
    fn test_cart_request_lists_line_ids() {
        let request = OrderRequest {
            source: OrderSource::Cart {
                items: vec![CartItemId::new(1), CartItemId::new(2)],
            },
            shipping_address: sample_input(),
            payment_method: PaymentMethod::Upi {
                vpa: "asha@upi".to_owned(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["source"], "cart");
        assert_eq!(json["items"], serde_json::json!([1, 2]));
    }
}
