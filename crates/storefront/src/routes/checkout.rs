//! Checkout route handlers.
//!
//! The wizard lives in the session between requests. Every POST advances
//! (or rewinds) it and renders whatever step it ends up on. `GET /checkout`
//! always starts over at the shipping step.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{
    AddressId, Cart, CardDetails, CheckoutError, CheckoutMode, CheckoutStep, CheckoutWizard,
    Money, OrderConfirmation, OrderSummary, PaymentDetails, PaymentMethod, ProductId,
    ShippingAddress, ShippingForm, SummaryRules, Wallet,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Page};
use crate::services::{self, CartSync, flash};
use crate::state::AppState;

use super::addresses::{FieldView, address_fields, missing_message};
use super::cart::positive_quantity;
use super::empty_string_as_none;

const CART_PATH: &str = "/cart";

// =============================================================================
// Forms
// =============================================================================

/// Checkout entry query. With a product id this is a buy-now checkout.
#[derive(Debug, Default, Deserialize)]
pub struct StartQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<i64>,
}

/// Saved address action on the shipping step.
#[derive(Debug, Deserialize)]
pub struct AddressActionForm {
    pub address_id: AddressId,
    pub action: AddressAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressAction {
    Select,
    Delete,
}

/// Payment step form. Every method's inputs arrive together; only the
/// chosen method's are read.
#[derive(Clone, Default, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub card_holder: String,
    #[serde(default)]
    pub card_expiry: String,
    #[serde(default)]
    pub card_cvv: String,
    #[serde(default)]
    pub upi_id: String,
    #[serde(default)]
    pub wallet: String,
}

impl PaymentForm {
    /// The details for the chosen method, or `None` if no method was picked.
    #[must_use]
    pub fn details(&self) -> Option<PaymentDetails> {
        match self.method.as_str() {
            "card" => Some(PaymentDetails::Card(CardDetails {
                number: self.card_number.clone(),
                holder_name: self.card_holder.clone(),
                expiry: self.card_expiry.clone(),
                cvv: self.card_cvv.clone(),
            })),
            "upi" => Some(PaymentDetails::Upi {
                vpa: self.upi_id.clone(),
            }),
            "wallet" => Some(PaymentDetails::Wallet {
                provider: Wallet::from_code(&self.wallet),
            }),
            "cod" => Some(PaymentDetails::CashOnDelivery),
            _ => None,
        }
    }

    /// The form as it may be echoed back: card number and CVV are dropped.
    #[must_use]
    pub fn redisplay(&self) -> Self {
        Self {
            card_number: String::new(),
            card_cvv: String::new(),
            ..self.clone()
        }
    }
}

/// Back navigation. Without a step, goes back one.
#[derive(Debug, Default, Deserialize)]
pub struct BackForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub step: Option<u8>,
}

// =============================================================================
// View models
// =============================================================================

/// One entry of the progress bar.
pub struct StepView {
    pub number: u8,
    pub title: &'static str,
    /// `done`, `current` or `todo`.
    pub state: &'static str,
    pub can_go_back: bool,
}

fn progress(current: CheckoutStep) -> Vec<StepView> {
    [
        CheckoutStep::Shipping,
        CheckoutStep::Payment,
        CheckoutStep::Review,
        CheckoutStep::Success,
    ]
    .into_iter()
    .map(|step| StepView {
        number: step.number(),
        title: step.title(),
        state: match step.cmp(&current) {
            std::cmp::Ordering::Less => "done",
            std::cmp::Ordering::Equal => "current",
            std::cmp::Ordering::Greater => "todo",
        },
        can_go_back: step < current && current != CheckoutStep::Success,
    })
    .collect()
}

/// One line of the order summary sidebar.
pub struct LineView {
    pub name: String,
    pub quantity: u32,
    pub total: Money,
}

/// The order summary sidebar.
pub struct SummaryView {
    pub lines: Vec<LineView>,
    pub totals: OrderSummary,
}

impl SummaryView {
    fn new(wizard: &CheckoutWizard, cart: &Cart, rules: &SummaryRules) -> Self {
        let lines = match wizard.mode() {
            CheckoutMode::Cart => cart
                .items
                .iter()
                .map(|item| LineView {
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                    total: item.line_total(),
                })
                .collect(),
            CheckoutMode::BuyNow {
                name,
                unit_price,
                quantity,
                ..
            } => vec![LineView {
                name: name.clone(),
                quantity: *quantity,
                total: *unit_price * *quantity,
            }],
        };

        Self {
            lines,
            totals: wizard.summary(cart, rules),
        }
    }
}

/// A saved address offered on the shipping step.
pub struct AddressOption {
    pub address: ShippingAddress,
    pub selected: bool,
}

/// A radio option (payment method or wallet).
pub struct ChoiceView {
    pub code: &'static str,
    pub label: String,
    pub selected: bool,
}

fn method_choices(selected: &str, rules: &SummaryRules) -> Vec<ChoiceView> {
    let cod_fee = Money::inr(rules.cod_fee);
    [
        ("card", "Credit / debit card".to_string()),
        ("upi", "UPI".to_string()),
        ("wallet", "Wallet".to_string()),
        ("cod", format!("Cash on Delivery (+{cod_fee})")),
    ]
    .into_iter()
    .map(|(code, label)| ChoiceView {
        code,
        label,
        selected: code == selected,
    })
    .collect()
}

fn wallet_choices(selected: &str) -> Vec<ChoiceView> {
    Wallet::ALL
        .into_iter()
        .map(|wallet| ChoiceView {
            code: wallet.code(),
            label: wallet.label().to_string(),
            selected: wallet.code() == selected,
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Step 1: shipping details.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub page: Page,
    pub progress: Vec<StepView>,
    pub order: SummaryView,
    pub addresses: Vec<AddressOption>,
    pub fields: Vec<FieldView>,
    pub error: Option<String>,
}

/// Step 2: payment method.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub page: Page,
    pub progress: Vec<StepView>,
    pub order: SummaryView,
    pub methods: Vec<ChoiceView>,
    pub wallets: Vec<ChoiceView>,
    pub form: PaymentForm,
    pub error: Option<String>,
}

/// Step 3: review and place the order.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewTemplate {
    pub page: Page,
    pub progress: Vec<StepView>,
    pub order: SummaryView,
    pub ship_to: String,
    pub payment: String,
    pub can_place: bool,
    pub error: Option<String>,
}

/// Step 4: confirmation.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct SuccessTemplate {
    pub page: Page,
    pub progress: Vec<StepView>,
    pub confirmation: OrderConfirmation,
    /// Items still in the cart after the order (buy-now leaves the cart alone).
    pub cart_items: u32,
}

// =============================================================================
// Rendering
// =============================================================================

/// Per-request context for rendering a step.
struct Checkout<'a> {
    state: &'a AppState,
    session: &'a Session,
    user: &'a CurrentUser,
}

impl Checkout<'_> {
    async fn wizard(&self) -> Result<Option<CheckoutWizard>> {
        Ok(services::checkout::load(self.session).await?)
    }

    async fn save(&self, wizard: &CheckoutWizard) -> Result<()> {
        Ok(services::checkout::save(self.session, wizard).await?)
    }

    /// The cart the wizard works from. Buy-now checkouts do not need it.
    async fn cart(&self, wizard: &CheckoutWizard) -> Result<Cart> {
        if wizard.is_buy_now() {
            return Ok(Cart::default());
        }
        CartSync::new(self.state.backend(), self.session, &self.user.token)
            .fetch()
            .await
    }

    async fn summary(&self, wizard: &CheckoutWizard) -> Result<SummaryView> {
        let cart = self.cart(wizard).await?;
        Ok(SummaryView::new(wizard, &cart, self.state.summary_rules()))
    }

    async fn shipping(
        &self,
        wizard: &CheckoutWizard,
        missing: &[&str],
        error: Option<String>,
    ) -> Result<Response> {
        let (order, addresses) = tokio::try_join!(
            self.summary(wizard),
            async {
                Ok::<_, AppError>(self.state.backend().addresses(&self.user.token).await?)
            }
        )?;

        let addresses = addresses
            .into_iter()
            .map(|address| AddressOption {
                selected: wizard.selected_address() == Some(address.id),
                address,
            })
            .collect();

        Ok(ShippingTemplate {
            page: Page::load(self.session).await,
            progress: progress(CheckoutStep::Shipping),
            order,
            addresses,
            fields: address_fields(wizard.shipping(), missing),
            error,
        }
        .into_response())
    }

    async fn payment(
        &self,
        wizard: &CheckoutWizard,
        form: &PaymentForm,
        error: Option<String>,
    ) -> Result<Response> {
        let rules = self.state.summary_rules();
        Ok(PaymentTemplate {
            page: Page::load(self.session).await,
            progress: progress(CheckoutStep::Payment),
            order: self.summary(wizard).await?,
            methods: method_choices(&form.method, rules),
            wallets: wallet_choices(&form.wallet),
            form: form.redisplay(),
            error,
        }
        .into_response())
    }

    async fn review(&self, wizard: &CheckoutWizard) -> Result<Response> {
        Ok(ReviewTemplate {
            page: Page::load(self.session).await,
            progress: progress(CheckoutStep::Review),
            order: self.summary(wizard).await?,
            ship_to: wizard.shipping().one_line(),
            payment: wizard
                .payment()
                .map(PaymentMethod::describe)
                .unwrap_or_default(),
            can_place: wizard.can_continue(None, today()),
            error: wizard.error().map(str::to_string),
        }
        .into_response())
    }

    async fn success(&self, confirmation: OrderConfirmation, cart_items: u32) -> Response {
        SuccessTemplate {
            page: Page::load(self.session).await,
            progress: progress(CheckoutStep::Success),
            confirmation,
            cart_items,
        }
        .into_response()
    }

    /// Render whatever step the wizard is on, with empty forms.
    async fn current(&self, wizard: &CheckoutWizard) -> Result<Response> {
        match wizard.step() {
            CheckoutStep::Shipping => self.shipping(wizard, &[], None).await,
            CheckoutStep::Payment => self.payment(wizard, &PaymentForm::default(), None).await,
            CheckoutStep::Review => self.review(wizard).await,
            CheckoutStep::Success => match wizard.confirmation() {
                Some(confirmation) => Ok(self.success(confirmation.clone(), 0).await),
                None => Ok(Redirect::to(CART_PATH).into_response()),
            },
        }
    }
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// No wizard in the session: checkout was never started or already ended.
async fn no_checkout(session: &Session) -> Result<Response> {
    flash::error(session, "Your checkout has expired. Please start again.").await?;
    Ok(Redirect::to(CART_PATH).into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Start a fresh checkout at the shipping step.
///
/// The cart path needs a settled, non-empty cart; otherwise the shopper is
/// sent back to the cart. The primary saved address, if any, is preselected.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<StartQuery>,
) -> Result<Response> {
    let backend = state.backend();

    let mode = if let Some(product_id) = query.product_id {
        let quantity = positive_quantity(query.quantity.unwrap_or(1))?;
        let product = backend.product(product_id).await.map_err(|e| match e {
            ApiError::NotFound(_) => AppError::NotFound(format!("product {product_id}")),
            other => other.into(),
        })?;
        if !product.in_stock() {
            flash::error(&session, format!("{} is out of stock", product.name)).await?;
            return Ok(Redirect::to(&format!("/products/{product_id}")).into_response());
        }
        CheckoutMode::BuyNow {
            product_id,
            name: product.name,
            unit_price: product.price,
            quantity,
        }
    } else {
        let cart = CartSync::new(backend, &session, &user.token).fetch().await?;
        if !cart.ready_for_checkout() {
            let message = if cart.pending_updates {
                "Your cart is still updating. Please try again."
            } else {
                "Your cart is empty."
            };
            tracing::info!(pending = cart.pending_updates, "Checkout refused");
            flash::error(&session, message).await?;
            return Ok(Redirect::to(CART_PATH).into_response());
        }
        CheckoutMode::Cart
    };

    let mut wizard = CheckoutWizard::new(mode)?;
    let addresses = backend.addresses(&user.token).await?;
    if let Some(primary) = addresses.iter().find(|address| address.is_primary) {
        wizard.select_address(primary)?;
    }
    services::checkout::save(&session, &wizard).await?;

    Checkout {
        state: &state,
        session: &session,
        user: &user,
    }
    .shipping(&wizard, &[], None)
    .await
}

/// Step 1 -> 2.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let checkout = Checkout {
        state: &state,
        session: &session,
        user: &user,
    };
    let Some(mut wizard) = checkout.wizard().await? else {
        return no_checkout(&session).await;
    };

    wizard.update_shipping(form)?;
    let outcome = wizard.continue_to_payment();
    checkout.save(&wizard).await?;

    match outcome {
        Ok(()) => checkout.payment(&wizard, &PaymentForm::default(), None).await,
        Err(CheckoutError::MissingShippingFields(missing)) => {
            let message = missing_message(&missing);
            checkout.shipping(&wizard, &missing, Some(message)).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Select or delete a saved address on the shipping step.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddressActionForm>,
) -> Result<Response> {
    let checkout = Checkout {
        state: &state,
        session: &session,
        user: &user,
    };
    let Some(mut wizard) = checkout.wizard().await? else {
        return no_checkout(&session).await;
    };
    let backend = state.backend();

    match form.action {
        AddressAction::Select => {
            let address = backend
                .addresses(&user.token)
                .await?
                .into_iter()
                .find(|address| address.id == form.address_id)
                .ok_or_else(|| AppError::NotFound(format!("address {}", form.address_id)))?;
            wizard.select_address(&address)?;
        }
        AddressAction::Delete => {
            let result = backend.delete_address(&user.token, form.address_id).await;
            if flash::outcome(&session, result, "Address deleted").await?.is_some() {
                wizard.address_removed(form.address_id);
            }
        }
    }

    checkout.save(&wizard).await?;
    checkout.current(&wizard).await
}

/// Step 2 -> 3. Only the validated method summary is kept.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id, method = %form.method))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let checkout = Checkout {
        state: &state,
        session: &session,
        user: &user,
    };
    let Some(mut wizard) = checkout.wizard().await? else {
        return no_checkout(&session).await;
    };

    let Some(details) = form.details() else {
        let error = Some("Please choose a payment method.".to_string());
        return checkout.payment(&wizard, &form, error).await;
    };

    match wizard.continue_to_review(&details, today()).map(|_| ()) {
        Ok(()) => {
            checkout.save(&wizard).await?;
            checkout.review(&wizard).await
        }
        Err(CheckoutError::Payment(e)) => {
            checkout.payment(&wizard, &form, Some(e.to_string())).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Go back one step, or jump to an earlier one.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn back(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<BackForm>,
) -> Result<Response> {
    let checkout = Checkout {
        state: &state,
        session: &session,
        user: &user,
    };
    let Some(mut wizard) = checkout.wizard().await? else {
        return no_checkout(&session).await;
    };

    match form.step {
        Some(number) => {
            let step = CheckoutStep::from_number(number)
                .ok_or_else(|| AppError::BadRequest(format!("unknown checkout step {number}")))?;
            wizard.go_to(step)?;
        }
        None => wizard.back()?,
    }

    checkout.save(&wizard).await?;
    checkout.current(&wizard).await
}

/// Step 3 -> 4: send the order once.
///
/// Success clears the wizard and shows the confirmation; a backend
/// rejection keeps the shopper on the review step with the error shown.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let checkout = Checkout {
        state: &state,
        session: &session,
        user: &user,
    };
    let Some(mut wizard) = checkout.wizard().await? else {
        return no_checkout(&session).await;
    };

    let cart = checkout.cart(&wizard).await?;
    if cart.pending_updates {
        flash::error(&session, "Your cart is still updating. Please try again.").await?;
        return Ok(Redirect::to(CART_PATH).into_response());
    }

    let request = match wizard.order_request(&cart) {
        Ok(request) => request,
        Err(CheckoutError::EmptyCart) => {
            services::checkout::clear(&session).await?;
            flash::error(&session, "Your cart is empty.").await?;
            return Ok(Redirect::to(CART_PATH).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    match state.backend().create_order(&user.token, &request).await {
        Ok(record) => {
            let confirmation = wizard.order_placed(record.id, record.summary)?.clone();
            services::checkout::clear(&session).await?;

            // The backend empties the cart for cart orders.
            let cart_items = CartSync::new(state.backend(), &session, &user.token)
                .fetch()
                .await
                .map(|cart| cart.item_count())
                .unwrap_or_default();

            Ok(checkout.success(confirmation, cart_items).await)
        }
        Err(ApiError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => {
            tracing::warn!(error = %e, "Order rejected");
            wizard.order_failed(e.user_message());
            checkout.save(&wizard).await?;
            checkout.review(&wizard).await
        }
    }
}
