//! In-process stand-in for the REST backend.
//!
//! Implements the slice of the backend API the storefront and the admin
//! dashboard call, over plain in-memory vectors. Tests seed a
//! [`BackendState`], run requests through the app, then inspect what the
//! backend received.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::COOKIE},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use bazaar_core::{
    AddressId, Cart, CartItem, CartItemId, Category, OrderId, OrderLine, OrderRecord,
    OrderRequest, OrderSource, OrderStatus, OrderSummary, Product, ProductId, ProductInput,
    ProductRef, Review, ReviewId, ShippingAddress, SummaryRules, User, UserId, UserRole,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Notify;
use url::Url;

/// Password every seeded user logs in with.
pub const PASSWORD: &str = "correct horse battery";

/// Admin key the dashboard must present on `/admin/...` calls.
pub const ADMIN_KEY: &str = "k7Qp2vX9mR4tZ8wL";

/// Name of the cookie carrying the backend token.
pub const AUTH_COOKIE: &str = "token";

/// Everything the stub backend holds.
#[derive(Debug, Default)]
pub struct BackendState {
    pub users: Vec<User>,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub reviews: Vec<Review>,
    pub cart: Vec<CartItem>,
    pub addresses: Vec<ShippingAddress>,
    pub orders: Vec<OrderRecord>,
    /// Ids of every `DELETE /cart/items/{id}` received.
    pub removed_items: Vec<CartItemId>,
    /// Ids of every `DELETE /addresses/{id}` received.
    pub deleted_addresses: Vec<AddressId>,
    /// Every `POST /orders` body received.
    pub order_requests: Vec<OrderRequest>,
    /// Number of calls that reached an `/admin/...` handler.
    pub admin_calls: usize,
    /// When set, cart writes wait on it before touching the cart.
    pub cart_gate: Option<CartGate>,
    /// Last id handed out for a created record; ids start at 501.
    pub last_id: i64,
}

/// Holds cart writes open so a test can act while one is in flight.
#[derive(Debug, Clone, Default)]
pub struct CartGate {
    /// Notified when a cart write reaches the backend.
    pub arrived: Arc<Notify>,
    /// Notify once to let the held write finish.
    pub release: Arc<Notify>,
}

impl CartGate {
    async fn pass(&self) {
        self.arrived.notify_one();
        self.release.notified().await;
    }
}

impl BackendState {
    /// Ids handed out for created records start here.
    const FIRST_ID: i64 = 500;

    fn next_id(&mut self) -> i64 {
        if self.last_id < Self::FIRST_ID {
            self.last_id = Self::FIRST_ID;
        }
        self.last_id += 1;
        self.last_id
    }

    /// The user whose token is in the request's cookie header.
    fn user(&self, headers: &HeaderMap) -> Option<User> {
        let cookies = headers.get(COOKIE)?.to_str().ok()?;
        let token = cookies
            .split(';')
            .find_map(|pair| pair.trim().strip_prefix("token="))?;
        let id: i64 = token.strip_prefix("tok-")?.parse().ok()?;
        self.users.iter().find(|user| user.id.as_i64() == id).cloned()
    }

    fn require_user(&self, headers: &HeaderMap) -> Result<User, StatusCode> {
        self.user(headers).ok_or(StatusCode::UNAUTHORIZED)
    }

    fn require_admin(&mut self, headers: &HeaderMap) -> Result<(), StatusCode> {
        let key = headers.get("x-admin-key").and_then(|v| v.to_str().ok());
        if key != Some(ADMIN_KEY) {
            return Err(StatusCode::FORBIDDEN);
        }
        if !self.require_user(headers)?.is_admin() {
            return Err(StatusCode::FORBIDDEN);
        }
        self.admin_calls += 1;
        Ok(())
    }
}

/// Handle to a running stub backend.
#[derive(Clone, Default)]
pub struct StubBackend {
    state: Arc<Mutex<BackendState>>,
}

impl StubBackend {
    #[must_use]
    pub fn new(state: BackendState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Lock the backend state for seeding or inspection.
    ///
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the lock.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().expect("backend state poisoned")
    }

    /// Serve the stub on an ephemeral port and return its base URL.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(&self) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr: SocketAddr = listener.local_addr().expect("Failed to read stub address");
        let app = router().with_state(self.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Stub backend failed");
        });

        Url::parse(&format!("http://{addr}/")).expect("Failed to build stub URL")
    }
}

fn router() -> Router<StubBackend> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/categories", get(categories))
        .route("/products", get(products))
        .route("/products/{id}", get(product_by_id))
        .route("/banners", get(banners))
        .route("/cart", get(cart))
        .route("/cart/items", post(add_cart_item))
        .route(
            "/cart/items/{id}",
            patch(update_cart_item).delete(remove_cart_item),
        )
        .route("/addresses", get(addresses))
        .route("/addresses/{id}", axum::routing::delete(delete_address))
        .route("/orders", get(orders).post(create_order))
        .route(
            "/admin/products",
            get(admin_products).post(admin_create_product),
        )
        .route(
            "/admin/products/{id}",
            get(admin_product)
                .put(admin_update_product)
                .delete(admin_delete_product),
        )
        .route("/admin/reviews", get(admin_reviews))
        .route(
            "/admin/reviews/{id}",
            axum::routing::delete(admin_delete_review),
        )
        .route("/admin/orders", get(admin_orders))
        .route("/admin/orders/{id}", get(admin_order))
        .route("/admin/orders/{id}/status", patch(admin_order_status))
}

type Handler<T> = Result<T, StatusCode>;

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(backend): State<StubBackend>, Json(body): Json<LoginBody>) -> Response {
    let state = backend.state();
    let user = state
        .users
        .iter()
        .find(|user| user.email.as_str() == body.email && body.password == PASSWORD);

    match user {
        Some(user) => Json(json!({
            "token": format!("tok-{}", user.id),
            "user": user,
        }))
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid credentials" })),
        )
            .into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

// =============================================================================
// Catalog
// =============================================================================

async fn categories(State(backend): State<StubBackend>) -> Json<Vec<Category>> {
    Json(backend.state().categories.clone())
}

async fn products(State(backend): State<StubBackend>) -> Json<Vec<Product>> {
    Json(backend.state().products.clone())
}

async fn product_by_id(
    State(backend): State<StubBackend>,
    Path(id): Path<ProductId>,
) -> Handler<Json<Product>> {
    backend
        .state()
        .products
        .iter()
        .find(|product| product.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Wait at the test's gate, if one is set.
async fn hold_cart_write(backend: &StubBackend) {
    let gate = backend.state().cart_gate.clone();
    if let Some(gate) = gate {
        gate.pass().await;
    }
}

async fn banners() -> Json<Vec<serde_json::Value>> {
    Json(Vec::new())
}

// =============================================================================
// Cart, addresses, orders
// =============================================================================

async fn cart(State(backend): State<StubBackend>, headers: HeaderMap) -> Handler<Json<Cart>> {
    let state = backend.state();
    state.require_user(&headers)?;
    Ok(Json(Cart::new(state.cart.clone())))
}

#[derive(Deserialize)]
struct AddItemBody {
    product_id: ProductId,
    quantity: u32,
}

async fn add_cart_item(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Json(body): Json<AddItemBody>,
) -> Handler<StatusCode> {
    hold_cart_write(&backend).await;
    let mut state = backend.state();
    state.require_user(&headers)?;
    let product = state
        .products
        .iter()
        .find(|product| product.id == body.product_id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)?;

    if let Some(line) = state.cart.iter_mut().find(|line| line.product.id == product.id) {
        line.quantity += body.quantity;
    } else {
        let id = CartItemId::new(state.next_id());
        state.cart.push(CartItem {
            id,
            product: ProductRef {
                id: product.id,
                name: product.name,
                image_url: None,
            },
            quantity: body.quantity,
            unit_price: product.price,
        });
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: u32,
}

async fn update_cart_item(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<CartItemId>,
    Json(body): Json<QuantityBody>,
) -> Handler<StatusCode> {
    hold_cart_write(&backend).await;
    let mut state = backend.state();
    state.require_user(&headers)?;
    let line = state
        .cart
        .iter_mut()
        .find(|line| line.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    line.quantity = body.quantity;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_cart_item(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<CartItemId>,
) -> Handler<StatusCode> {
    let mut state = backend.state();
    state.require_user(&headers)?;
    state.removed_items.push(id);
    state.cart.retain(|line| line.id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn addresses(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
) -> Handler<Json<Vec<ShippingAddress>>> {
    let state = backend.state();
    state.require_user(&headers)?;
    Ok(Json(state.addresses.clone()))
}

async fn delete_address(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<AddressId>,
) -> Handler<StatusCode> {
    let mut state = backend.state();
    state.require_user(&headers)?;
    state.deleted_addresses.push(id);
    state.addresses.retain(|address| address.id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn orders(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
) -> Handler<Json<Vec<OrderRecord>>> {
    let state = backend.state();
    state.require_user(&headers)?;
    Ok(Json(state.orders.clone()))
}

async fn create_order(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderRecord>), Response> {
    let mut state = backend.state();
    state
        .require_user(&headers)
        .map_err(IntoResponse::into_response)?;

    let lines: Vec<CartItem> = match &request.source {
        OrderSource::Cart { items } => state
            .cart
            .iter()
            .filter(|line| items.contains(&line.id))
            .cloned()
            .collect(),
        OrderSource::BuyNow {
            product_id,
            quantity,
        } => state
            .products
            .iter()
            .filter(|product| product.id == *product_id)
            .map(|product| CartItem {
                id: CartItemId::new(0),
                product: ProductRef {
                    id: product.id,
                    name: product.name.clone(),
                    image_url: None,
                },
                quantity: *quantity,
                unit_price: product.price,
            })
            .collect(),
    };
    if lines.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "nothing to order" })),
        )
            .into_response());
    }

    let summary = OrderSummary::for_items(
        &lines,
        Some(&request.payment_method),
        &SummaryRules::default(),
    );
    let record = OrderRecord {
        id: OrderId::new(state.next_id()),
        items: lines
            .iter()
            .map(|line| OrderLine {
                product_id: line.product.id,
                name: line.product.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect(),
        shipping_address: request.shipping_address.clone(),
        payment_method: request.payment_method.clone(),
        status: OrderStatus::Pending,
        summary,
        created_at: Utc::now(),
    };

    if let OrderSource::Cart { items } = &request.source {
        state.cart.retain(|line| !items.contains(&line.id));
    }
    state.orders.push(record.clone());
    state.order_requests.push(request);

    Ok((StatusCode::CREATED, Json(record)))
}

// =============================================================================
// Admin
// =============================================================================

async fn admin_products(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
) -> Handler<Json<Vec<Product>>> {
    let mut state = backend.state();
    state.require_admin(&headers)?;
    Ok(Json(state.products.clone()))
}

async fn admin_product(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Handler<Json<Product>> {
    let mut state = backend.state();
    state.require_admin(&headers)?;
    state
        .products
        .iter()
        .find(|product| product.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

fn slug_taken(state: &BackendState, slug: &str, except: Option<ProductId>) -> bool {
    state
        .products
        .iter()
        .any(|product| product.slug == slug && Some(product.id) != except)
}

fn slug_conflict() -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({ "error": "slug already taken" })),
    )
        .into_response()
}

fn product_from(id: ProductId, input: ProductInput) -> Product {
    Product {
        id,
        name: input.name,
        slug: input.slug,
        description: input.description,
        price: bazaar_core::Money::inr(input.price),
        stock: input.stock,
        category_id: input.category_id,
        images: input.images,
        rating: 0.0,
        review_count: 0,
    }
}

async fn admin_create_product(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), Response> {
    let mut state = backend.state();
    state
        .require_admin(&headers)
        .map_err(IntoResponse::into_response)?;
    if slug_taken(&state, &input.slug, None) {
        return Err(slug_conflict());
    }

    let product = product_from(ProductId::new(state.next_id()), input);
    state.products.push(product.clone());
    Ok((StatusCode::CREATED, Json(product)))
}

async fn admin_update_product(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, Response> {
    let mut state = backend.state();
    state
        .require_admin(&headers)
        .map_err(IntoResponse::into_response)?;
    if slug_taken(&state, &input.slug, Some(id)) {
        return Err(slug_conflict());
    }

    let slot = state
        .products
        .iter_mut()
        .find(|product| product.id == id)
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    *slot = product_from(id, input);
    Ok(Json(slot.clone()))
}

async fn admin_delete_product(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Handler<StatusCode> {
    let mut state = backend.state();
    state.require_admin(&headers)?;
    let before = state.products.len();
    state.products.retain(|product| product.id != id);
    if state.products.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn admin_reviews(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
) -> Handler<Json<Vec<Review>>> {
    let mut state = backend.state();
    state.require_admin(&headers)?;
    Ok(Json(state.reviews.clone()))
}

async fn admin_delete_review(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<ReviewId>,
) -> Handler<StatusCode> {
    let mut state = backend.state();
    state.require_admin(&headers)?;
    state.reviews.retain(|review| review.id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn admin_orders(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
) -> Handler<Json<Vec<OrderRecord>>> {
    let mut state = backend.state();
    state.require_admin(&headers)?;
    Ok(Json(state.orders.clone()))
}

async fn admin_order(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
) -> Handler<Json<OrderRecord>> {
    let mut state = backend.state();
    state.require_admin(&headers)?;
    state
        .orders
        .iter()
        .find(|order| order.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

async fn admin_order_status(
    State(backend): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusBody>,
) -> Handler<Json<OrderRecord>> {
    let mut state = backend.state();
    state.require_admin(&headers)?;
    let order = state
        .orders
        .iter_mut()
        .find(|order| order.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    order.status = body.status;
    Ok(Json(order.clone()))
}

/// A product priced in whole rupees.
#[must_use]
pub fn product(id: i64, name: &str, rupees: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        slug: name.to_ascii_lowercase().replace(' ', "-"),
        description: String::new(),
        price: bazaar_core::Money::inr(Decimal::new(rupees, 0)),
        stock,
        category_id: None,
        images: Vec::new(),
        rating: 0.0,
        review_count: 0,
    }
}

/// A cart line for `product`.
#[must_use]
pub fn cart_line(id: i64, product: &Product, quantity: u32) -> CartItem {
    CartItem {
        id: CartItemId::new(id),
        product: ProductRef {
            id: product.id,
            name: product.name.clone(),
            image_url: None,
        },
        quantity,
        unit_price: product.price,
    }
}

/// A user who logs in with [`PASSWORD`].
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn user(id: i64, name: &str, email: &str, role: UserRole) -> User {
    User {
        id: UserId::new(id),
        name: name.to_string(),
        email: bazaar_core::Email::parse(email).expect("valid email"),
        role,
    }
}
