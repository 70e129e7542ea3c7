//! The checkout wizard.
//!
//! Four strictly linear steps:
//!
//! ```text
//! Shipping(1) -> Payment(2) -> Review(3) -> Success(4)
//! ```
//!
//! Each forward move is gated by a validator. Back-navigation is allowed
//! between steps 1-3; once the order is placed the wizard is finished.
//! Nothing here talks to the network: the storefront asks the wizard for an
//! [`OrderRequest`], sends it, and reports the outcome back with
//! [`CheckoutWizard::order_placed`] or [`CheckoutWizard::order_failed`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{AddressInput, ShippingAddress};
use crate::cart::Cart;
use crate::order::{OrderRequest, OrderSource};
use crate::payment::{PaymentDetails, PaymentError, PaymentMethod};
use crate::summary::{OrderSummary, SummaryRules};
use crate::types::{AddressId, Money, OrderId, ProductId};

/// Shipping step form fields.
pub type ShippingForm = AddressInput;

/// Errors raised by wizard transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("missing shipping details: {}", .0.join(", "))]
    MissingShippingFields(Vec<&'static str>),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: CheckoutStep, to: CheckoutStep },

    #[error("your cart is empty")]
    EmptyCart,

    #[error("no payment method selected")]
    PaymentNotChosen,

    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// A wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Review,
    Success,
}

impl CheckoutStep {
    /// 1-based step number shown in the progress bar.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Review => 3,
            Self::Success => 4,
        }
    }

    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Shipping),
            2 => Some(Self::Payment),
            3 => Some(Self::Review),
            4 => Some(Self::Success),
            _ => None,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
            Self::Success => "Order placed",
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

/// What is being checked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CheckoutMode {
    /// Everything in the shopper's cart.
    Cart,
    /// A single product, bypassing the cart.
    BuyNow {
        product_id: ProductId,
        name: String,
        unit_price: Money,
        quantity: u32,
    },
}

/// What the success step shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub summary: OrderSummary,
    pub payment: String,
    pub ship_to: String,
}

/// Checkout wizard state.
///
/// Only validated data is kept: raw card fields are checked and dropped on
/// the way from the payment step to the review step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    mode: CheckoutMode,
    shipping: ShippingForm,
    selected_address: Option<AddressId>,
    payment: Option<PaymentMethod>,
    error: Option<String>,
    confirmation: Option<OrderConfirmation>,
}

impl CheckoutWizard {
    /// Start a fresh wizard at the shipping step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidQuantity`] for a buy-now quantity of 0.
    pub fn new(mode: CheckoutMode) -> Result<Self, CheckoutError> {
        if matches!(mode, CheckoutMode::BuyNow { quantity: 0, .. }) {
            return Err(CheckoutError::InvalidQuantity);
        }
        Ok(Self {
            step: CheckoutStep::Shipping,
            mode,
            shipping: ShippingForm::default(),
            selected_address: None,
            payment: None,
            error: None,
            confirmation: None,
        })
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn mode(&self) -> &CheckoutMode {
        &self.mode
    }

    #[must_use]
    pub const fn is_buy_now(&self) -> bool {
        matches!(self.mode, CheckoutMode::BuyNow { .. })
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingForm {
        &self.shipping
    }

    #[must_use]
    pub const fn selected_address(&self) -> Option<AddressId> {
        self.selected_address
    }

    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentMethod> {
        self.payment.as_ref()
    }

    /// The last order-placement error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.confirmation.as_ref()
    }

    fn require_step(&self, step: CheckoutStep, to: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == step {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                from: self.step,
                to,
            })
        }
    }

    /// Replace the shipping form with what the shopper typed.
    ///
    /// Typing over a selected address detaches it from the selection.
    ///
    /// # Errors
    ///
    /// Fails outside the shipping step.
    pub fn update_shipping(&mut self, form: ShippingForm) -> Result<(), CheckoutError> {
        self.require_step(CheckoutStep::Shipping, CheckoutStep::Shipping)?;
        if form != self.shipping {
            self.selected_address = None;
        }
        self.shipping = form;
        Ok(())
    }

    /// Fill the shipping form from a saved address.
    ///
    /// # Errors
    ///
    /// Fails outside the shipping step.
    pub fn select_address(&mut self, address: &ShippingAddress) -> Result<(), CheckoutError> {
        self.require_step(CheckoutStep::Shipping, CheckoutStep::Shipping)?;
        self.shipping = address.fields.clone();
        self.selected_address = Some(address.id);
        Ok(())
    }

    /// A saved address was deleted. If it was the selected one, the form
    /// it populated is cleared.
    pub fn address_removed(&mut self, id: AddressId) {
        if self.selected_address == Some(id) {
            self.selected_address = None;
            self.shipping = ShippingForm::default();
        }
    }

    /// Step 1 -> 2. All required shipping fields must be non-blank.
    ///
    /// # Errors
    ///
    /// Lists the missing fields and stays on the shipping step.
    pub fn continue_to_payment(&mut self) -> Result<(), CheckoutError> {
        self.require_step(CheckoutStep::Shipping, CheckoutStep::Payment)?;
        let missing = self.shipping.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::MissingShippingFields(missing));
        }
        self.shipping = self.shipping.trimmed();
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Step 2 -> 3, gated by the method-specific validator.
    ///
    /// # Errors
    ///
    /// Returns the validator's error and stays on the payment step.
    pub fn continue_to_review(
        &mut self,
        details: &PaymentDetails,
        today: NaiveDate,
    ) -> Result<&PaymentMethod, CheckoutError> {
        self.require_step(CheckoutStep::Payment, CheckoutStep::Review)?;
        let method = details.validate(today)?;
        self.step = CheckoutStep::Review;
        self.error = None;
        Ok(&*self.payment.insert(method))
    }

    /// Whether the "continue" action is enabled on the current step.
    ///
    /// `details` is only consulted on the payment step.
    #[must_use]
    pub fn can_continue(&self, details: Option<&PaymentDetails>, today: NaiveDate) -> bool {
        match self.step {
            CheckoutStep::Shipping => self.shipping.is_complete(),
            CheckoutStep::Payment => details.is_some_and(|d| d.is_valid(today)),
            CheckoutStep::Review => self.payment.is_some(),
            CheckoutStep::Success => false,
        }
    }

    /// Go back one step.
    ///
    /// # Errors
    ///
    /// Fails on the shipping step (nothing before it) and on the success
    /// step (the order is already placed).
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        let to = match self.step {
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Review => CheckoutStep::Payment,
            CheckoutStep::Shipping | CheckoutStep::Success => {
                return Err(CheckoutError::InvalidTransition {
                    from: self.step,
                    to: self.step,
                });
            }
        };
        self.step = to;
        self.error = None;
        Ok(())
    }

    /// Jump back to an earlier step.
    ///
    /// # Errors
    ///
    /// Only backwards jumps within steps 1-3 are allowed.
    pub fn go_to(&mut self, step: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == CheckoutStep::Success || step >= self.step {
            return Err(CheckoutError::InvalidTransition {
                from: self.step,
                to: step,
            });
        }
        self.step = step;
        self.error = None;
        Ok(())
    }

    /// Totals for the current mode and chosen payment method.
    #[must_use]
    pub fn summary(&self, cart: &Cart, rules: &SummaryRules) -> OrderSummary {
        match &self.mode {
            CheckoutMode::Cart => {
                OrderSummary::for_items(&cart.items, self.payment.as_ref(), rules)
            }
            CheckoutMode::BuyNow {
                unit_price,
                quantity,
                ..
            } => OrderSummary::for_single(*unit_price, *quantity, self.payment.as_ref(), rules),
        }
    }

    /// Assemble the order payload on the review step.
    ///
    /// # Errors
    ///
    /// Fails off the review step, without a payment method, or in cart
    /// mode with an empty cart.
    pub fn order_request(&self, cart: &Cart) -> Result<OrderRequest, CheckoutError> {
        self.require_step(CheckoutStep::Review, CheckoutStep::Success)?;
        let payment_method = self.payment.clone().ok_or(CheckoutError::PaymentNotChosen)?;

        let source = match &self.mode {
            CheckoutMode::Cart => {
                if cart.is_empty() {
                    return Err(CheckoutError::EmptyCart);
                }
                OrderSource::Cart {
                    items: cart.items.iter().map(|item| item.id).collect(),
                }
            }
            CheckoutMode::BuyNow {
                product_id,
                quantity,
                ..
            } => OrderSource::BuyNow {
                product_id: *product_id,
                quantity: *quantity,
            },
        };

        Ok(OrderRequest {
            source,
            shipping_address: self.shipping.clone(),
            payment_method,
        })
    }

    /// Step 3 -> 4 after the backend accepted the order.
    ///
    /// # Errors
    ///
    /// Fails off the review step.
    pub fn order_placed(
        &mut self,
        order_id: OrderId,
        summary: OrderSummary,
    ) -> Result<&OrderConfirmation, CheckoutError> {
        self.require_step(CheckoutStep::Review, CheckoutStep::Success)?;
        let payment = self
            .payment
            .as_ref()
            .map(PaymentMethod::describe)
            .ok_or(CheckoutError::PaymentNotChosen)?;

        self.step = CheckoutStep::Success;
        self.error = None;
        Ok(&*self.confirmation.insert(OrderConfirmation {
            order_id,
            summary,
            payment,
            ship_to: self.shipping.one_line(),
        }))
    }

    /// The backend rejected the order. The wizard stays on the review step.
    pub fn order_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::address::tests::sample_input;
    use crate::cart::tests::item;
    use crate::payment::{CardDetails, Wallet};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn at_payment() -> CheckoutWizard {
        let mut wizard = CheckoutWizard::new(CheckoutMode::Cart).unwrap();
        wizard.update_shipping(sample_input()).unwrap();
        wizard.continue_to_payment().unwrap();
        wizard
    }

    fn at_review() -> CheckoutWizard {
        let mut wizard = at_payment();
        wizard
            .continue_to_review(&PaymentDetails::CashOnDelivery, today())
            .unwrap();
        wizard
    }

    fn buy_now(quantity: u32) -> CheckoutMode {
        CheckoutMode::BuyNow {
            product_id: ProductId::new(5),
            name: "Tea".to_owned(),
            unit_price: Money::inr(Decimal::new(250, 0)),
            quantity,
        }
    }

    #[test]
    fn test_starts_at_shipping() {
        let wizard = CheckoutWizard::new(CheckoutMode::Cart).unwrap();
        assert_eq!(wizard.step(), CheckoutStep::Shipping);
        assert!(!wizard.can_continue(None, today()));
    }

    #[test]
    fn test_buy_now_rejects_zero_quantity() {
        assert_eq!(
            CheckoutWizard::new(buy_now(0)),
            Err(CheckoutError::InvalidQuantity)
        );
    }

    #[test]
    fn test_shipping_requires_fields() {
        let mut wizard = CheckoutWizard::new(CheckoutMode::Cart).unwrap();
        let mut form = sample_input();
        form.postal_code = " ".to_owned();
        wizard.update_shipping(form).unwrap();

        assert_eq!(
            wizard.continue_to_payment(),
            Err(CheckoutError::MissingShippingFields(vec!["postal_code"]))
        );
        assert_eq!(wizard.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_continue_disabled_until_payment_valid() {
        let wizard = at_payment();
        let invalid = [
            PaymentDetails::Card(CardDetails::default()),
            PaymentDetails::Upi {
                vpa: "nobody".to_owned(),
            },
            PaymentDetails::Wallet { provider: None },
        ];
        for details in &invalid {
            assert!(!wizard.can_continue(Some(details), today()), "{details:?}");
        }
        assert!(!wizard.can_continue(None, today()));

        let valid = [
            PaymentDetails::Card(CardDetails {
                number: "4111111111111111".to_owned(),
                holder_name: "Asha".to_owned(),
                expiry: "10/26".to_owned(),
                cvv: "999".to_owned(),
            }),
            PaymentDetails::Upi {
                vpa: "asha@bank".to_owned(),
            },
            PaymentDetails::Wallet {
                provider: Some(Wallet::Paytm),
            },
            PaymentDetails::CashOnDelivery,
        ];
        for details in &valid {
            assert!(wizard.can_continue(Some(details), today()), "{details:?}");
        }
    }

    #[test]
    fn test_invalid_payment_stays_on_payment() {
        let mut wizard = at_payment();
        let err = wizard
            .continue_to_review(&PaymentDetails::Wallet { provider: None }, today())
            .unwrap_err();
        assert_eq!(err, CheckoutError::Payment(PaymentError::WalletNotSelected));
        assert_eq!(wizard.step(), CheckoutStep::Payment);
        assert!(wizard.payment().is_none());
    }

    #[test]
    fn test_back_navigation() {
        let mut wizard = at_review();
        wizard.back().unwrap();
        assert_eq!(wizard.step(), CheckoutStep::Payment);
        wizard.back().unwrap();
        assert_eq!(wizard.step(), CheckoutStep::Shipping);
        assert!(wizard.back().is_err());
    }

    #[test]
    fn test_go_to_only_backwards() {
        let mut wizard = at_payment();
        assert!(wizard.go_to(CheckoutStep::Review).is_err());
        assert!(wizard.go_to(CheckoutStep::Payment).is_err());
        wizard.go_to(CheckoutStep::Shipping).unwrap();
        assert_eq!(wizard.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_no_way_back_from_success() {
        let mut wizard = at_review();
        let cart = Cart::new(vec![item(1, 2, 1, 100)]);
        let summary = wizard.summary(&cart, &SummaryRules::default());
        wizard.order_placed(OrderId::new(77), summary).unwrap();

        assert_eq!(wizard.step(), CheckoutStep::Success);
        assert!(wizard.back().is_err());
        assert!(wizard.go_to(CheckoutStep::Shipping).is_err());
        assert!(!wizard.can_continue(None, today()));
    }

    #[test]
    fn test_cannot_skip_steps() {
        let mut wizard = CheckoutWizard::new(CheckoutMode::Cart).unwrap();
        assert!(matches!(
            wizard.continue_to_review(&PaymentDetails::CashOnDelivery, today()),
            Err(CheckoutError::InvalidTransition { .. })
        ));
        assert!(wizard.order_request(&Cart::default()).is_err());
    }

    #[test]
    fn test_empty_cart_order_refused() {
        let wizard = at_review();
        assert_eq!(
            wizard.order_request(&Cart::default()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_cart_order_request() {
        let wizard = at_review();
        let cart = Cart::new(vec![item(3, 10, 1, 100), item(4, 11, 2, 50)]);
        let request = wizard.order_request(&cart).unwrap();
        assert_eq!(
            request.source,
            OrderSource::Cart {
                items: vec![crate::CartItemId::new(3), crate::CartItemId::new(4)]
            }
        );
        assert_eq!(request.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(request.shipping_address, sample_input());
    }

    #[test]
    fn test_buy_now_ignores_empty_cart() {
        let mut wizard = CheckoutWizard::new(buy_now(2)).unwrap();
        wizard.update_shipping(sample_input()).unwrap();
        wizard.continue_to_payment().unwrap();
        wizard
            .continue_to_review(
                &PaymentDetails::Upi {
                    vpa: "a@b".to_owned(),
                },
                today(),
            )
            .unwrap();

        let request = wizard.order_request(&Cart::default()).unwrap();
        assert_eq!(
            request.source,
            OrderSource::BuyNow {
                product_id: ProductId::new(5),
                quantity: 2
            }
        );
        let summary = wizard.summary(&Cart::default(), &SummaryRules::default());
        assert_eq!(summary.subtotal, Money::inr(Decimal::new(500, 0)));
    }

    #[test]
    fn test_order_failure_stays_on_review() {
        let mut wizard = at_review();
        wizard.order_failed("out of stock");
        assert_eq!(wizard.step(), CheckoutStep::Review);
        assert_eq!(wizard.error(), Some("out of stock"));
        assert!(wizard.confirmation().is_none());
    }

    #[test]
    fn test_summary_includes_cod_fee_after_payment() {
        let cart = Cart::new(vec![item(1, 2, 1, 600)]);
        let rules = SummaryRules::default();
        assert!(at_payment().summary(&cart, &rules).cod_fee.is_zero());
        assert_eq!(
            at_review().summary(&cart, &rules).total,
            Money::inr(Decimal::new(650, 0))
        );
    }

    #[test]
    fn test_select_then_remove_address_clears_form() {
        let mut wizard = CheckoutWizard::new(CheckoutMode::Cart).unwrap();
        let saved = ShippingAddress {
            id: AddressId::new(8),
            fields: sample_input(),
            is_primary: true,
        };
        wizard.select_address(&saved).unwrap();
        assert_eq!(wizard.shipping(), &sample_input());
        assert_eq!(wizard.selected_address(), Some(AddressId::new(8)));

        wizard.address_removed(AddressId::new(9));
        assert_eq!(wizard.shipping(), &sample_input());

        wizard.address_removed(AddressId::new(8));
        assert_eq!(wizard.shipping(), &ShippingForm::default());
        assert_eq!(wizard.selected_address(), None);
    }

    #[test]
    fn test_editing_form_detaches_selection() {
        let mut wizard = CheckoutWizard::new(CheckoutMode::Cart).unwrap();
        let saved = ShippingAddress {
            id: AddressId::new(8),
            fields: sample_input(),
            is_primary: false,
        };
        wizard.select_address(&saved).unwrap();

        let mut edited = sample_input();
        edited.phone = "1112223334".to_owned();
        wizard.update_shipping(edited).unwrap();
        assert_eq!(wizard.selected_address(), None);

        wizard.address_removed(AddressId::new(8));
        assert_eq!(wizard.shipping().phone, "1112223334");
    }

    #[test]
    fn test_wizard_survives_session_roundtrip() {
        let wizard = at_review();
        let json = serde_json::to_string(&wizard).unwrap();
        let back: CheckoutWizard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, wizard);
    }
}
