//! Order summary computation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartItem, total_quantity};
use crate::payment::PaymentMethod;
use crate::types::Money;

/// Fee rules applied on top of the item subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRules {
    /// Subtotals at or above this ship free.
    pub free_shipping_threshold: Decimal,
    /// Flat shipping fee below the threshold.
    pub shipping_fee: Decimal,
    /// Flat surcharge for Cash on Delivery.
    pub cod_fee: Decimal,
}

impl Default for SummaryRules {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(500, 0),
            shipping_fee: Decimal::new(40, 0),
            cod_fee: Decimal::new(50, 0),
        }
    }
}

/// Totals shown on the review step and the success page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub cod_fee: Money,
    pub total: Money,
}

impl OrderSummary {
    /// Summarize cart lines.
    ///
    /// `method` is `None` before a payment method has been chosen, in which
    /// case no COD fee is applied.
    #[must_use]
    pub fn for_items(
        items: &[CartItem],
        method: Option<&PaymentMethod>,
        rules: &SummaryRules,
    ) -> Self {
        let item_count = total_quantity(items);
        let subtotal: Money = items.iter().map(CartItem::line_total).sum();
        Self::compute(item_count, subtotal, method, rules)
    }

    /// Summarize a single buy-now product.
    #[must_use]
    pub fn for_single(
        unit_price: Money,
        quantity: u32,
        method: Option<&PaymentMethod>,
        rules: &SummaryRules,
    ) -> Self {
        Self::compute(quantity, unit_price * quantity, method, rules)
    }

    fn compute(
        item_count: u32,
        subtotal: Money,
        method: Option<&PaymentMethod>,
        rules: &SummaryRules,
    ) -> Self {
        let currency = subtotal.currency;
        let ships_free = subtotal.amount >= rules.free_shipping_threshold || item_count == 0;
        let shipping_fee = if ships_free {
            Money::zero(currency)
        } else {
            Money::new(rules.shipping_fee, currency)
        };
        let cod_fee = if method.is_some_and(PaymentMethod::is_cod) {
            Money::new(rules.cod_fee, currency)
        } else {
            Money::zero(currency)
        };

        Self {
            item_count,
            subtotal,
            shipping_fee,
            cod_fee,
            total: subtotal + shipping_fee + cod_fee,
        }
    }

    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.shipping_fee.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::item;

    fn inr(amount: i64) -> Money {
        Money::inr(Decimal::new(amount, 0))
    }

    #[test]
    fn test_shipping_fee_below_threshold() {
        let items = [item(1, 10, 2, 120)];
        let summary = OrderSummary::for_items(&items, None, &SummaryRules::default());
        assert_eq!(summary.subtotal, inr(240));
        assert_eq!(summary.shipping_fee, inr(40));
        assert_eq!(summary.total, inr(280));
        assert!(!summary.free_shipping());
    }

    #[test]
    fn test_item_count_saturates() {
        let items = [item(1, 10, u32::MAX, 0), item(2, 11, 3, 0)];
        let summary = OrderSummary::for_items(&items, None, &SummaryRules::default());
        assert_eq!(summary.item_count, u32::MAX);
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        let items = [item(1, 10, 1, 500)];
        let summary = OrderSummary::for_items(&items, None, &SummaryRules::default());
        assert!(summary.free_shipping());
        assert_eq!(summary.total, inr(500));
    }

    #[test]
    fn test_cod_fee_only_for_cod() {
        let rules = SummaryRules::default();
        let items = [item(1, 10, 1, 600)];

        let cod = OrderSummary::for_items(&items, Some(&PaymentMethod::CashOnDelivery), &rules);
        assert_eq!(cod.cod_fee, inr(50));
        assert_eq!(cod.total, inr(650));

        let upi = PaymentMethod::Upi {
            vpa: "a@b".to_owned(),
        };
        let paid = OrderSummary::for_items(&items, Some(&upi), &rules);
        assert!(paid.cod_fee.is_zero());
        assert_eq!(paid.total, inr(600));
    }

    #[test]
    fn test_buy_now_summary() {
        let summary = OrderSummary::for_single(
            inr(199),
            3,
            Some(&PaymentMethod::CashOnDelivery),
            &SummaryRules::default(),
        );
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, inr(597));
        assert!(summary.free_shipping());
        assert_eq!(summary.total, inr(647));
    }

    #[test]
    fn test_custom_rules() {
        let rules = SummaryRules {
            free_shipping_threshold: Decimal::new(1000, 0),
            shipping_fee: Decimal::new(75, 0),
            cod_fee: Decimal::ZERO,
        };
        let summary =
            OrderSummary::for_single(inr(600), 1, Some(&PaymentMethod::CashOnDelivery), &rules);
        assert_eq!(summary.total, inr(675));
    }
}
