//! Cart mutations through the storefront.
//!
//! Every mutation is one backend call followed by a refetch; these tests
//! check what reached the backend and what the shopper sees afterwards.

use bazaar_core::{CartItemId, UserRole};
use bazaar_integration_tests::backend::{cart_line, product, user};
use bazaar_integration_tests::{BackendState, Browser, StubBackend, location, spawn_storefront};
use reqwest::StatusCode;

const SHOPPER: &str = "asha@example.in";

fn seeded() -> BackendState {
    let chai = product(10, "Masala Chai", 180, 20);
    let ghee = product(11, "A2 Cow Ghee", 650, 8);
    let honey = product(12, "Wild Forest Honey", 320, 4);
    BackendState {
        users: vec![user(1, "Asha", SHOPPER, UserRole::Customer)],
        cart: vec![
            cart_line(1, &chai, 2),
            cart_line(2, &ghee, 1),
            cart_line(3, &honey, 1),
        ],
        products: vec![chai, ghee, honey],
        ..BackendState::default()
    }
}

async fn signed_in(state: BackendState) -> (StubBackend, Browser) {
    let backend = StubBackend::new(state);
    let url = backend.spawn().await;
    let browser = Browser::new(spawn_storefront(url).await);
    browser.login("/auth/login", SHOPPER).await;
    (backend, browser)
}

#[tokio::test]
async fn test_cart_requires_login() {
    let backend = StubBackend::new(seeded());
    let url = backend.spawn().await;
    let browser = Browser::new(spawn_storefront(url).await);

    let response = browser.get("/cart").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_remove_deletes_only_that_line() {
    let (backend, browser) = signed_in(seeded()).await;

    let response = browser.post("/cart/remove", &[("item_id", "2")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Masala Chai"));
    assert!(body.contains("Wild Forest Honey"));
    assert!(!body.contains("A2 Cow Ghee"));

    let state = backend.state();
    assert_eq!(state.removed_items, vec![CartItemId::new(2)]);
    let remaining: Vec<i64> = state.cart.iter().map(|line| line.id.as_i64()).collect();
    assert_eq!(remaining, vec![1, 3]);
}

#[tokio::test]
async fn test_add_existing_product_increases_quantity() {
    let (backend, browser) = signed_in(seeded()).await;

    let response = browser
        .post("/cart/add", &[("product_id", "10"), ("quantity", "1")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let state = backend.state();
    let chai = state.cart.iter().find(|line| line.id == CartItemId::new(1)).unwrap();
    assert_eq!(chai.quantity, 3);
    assert_eq!(state.cart.len(), 3);
}

#[tokio::test]
async fn test_zero_quantity_never_reaches_backend() {
    let (backend, browser) = signed_in(seeded()).await;

    let response = browser
        .post("/cart/update", &[("item_id", "1"), ("quantity", "0")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let state = backend.state();
    assert_eq!(state.cart.first().unwrap().quantity, 2);
}
