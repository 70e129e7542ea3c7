//! Shopper-scoped endpoints: cart, saved addresses and orders.
//!
//! All of these require the shopper's token and are never cached.

use bazaar_core::{
    AddressId, AddressInput, Cart, CartItemId, OrderRecord, OrderRequest, ProductId,
    ShippingAddress,
};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiError, AuthToken, BackendClient};

#[derive(Serialize)]
struct AddItemBody {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct QuantityBody {
    quantity: u32,
}

impl BackendClient {
    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn cart(&self, token: &AuthToken) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart"])?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the line.
    #[instrument(skip(self, token))]
    pub async fn add_cart_item(
        &self,
        token: &AuthToken,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", "items"])?;
        let body = AddItemBody {
            product_id,
            quantity,
        };
        self.send_empty(self.request(Method::POST, url, Some(token)).json(&body))
            .await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token))]
    pub async fn update_cart_item(
        &self,
        token: &AuthToken,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", "items", &item_id.to_string()])?;
        self.send_empty(
            self.request(Method::PATCH, url, Some(token))
                .json(&QuantityBody { quantity }),
        )
        .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_cart_item(
        &self,
        token: &AuthToken,
        item_id: CartItemId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", "items", &item_id.to_string()])?;
        self.send_empty(self.request(Method::DELETE, url, Some(token)))
            .await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// List saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn addresses(&self, token: &AuthToken) -> Result<Vec<ShippingAddress>, ApiError> {
        let url = self.endpoint(&["addresses"])?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip_all)]
    pub async fn create_address(
        &self,
        token: &AuthToken,
        address: &AddressInput,
    ) -> Result<ShippingAddress, ApiError> {
        let url = self.endpoint(&["addresses"])?;
        self.send_json(self.request(Method::POST, url, Some(token)).json(address))
            .await
    }

    /// Replace a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self, token, address))]
    pub async fn update_address(
        &self,
        token: &AuthToken,
        id: AddressId,
        address: &AddressInput,
    ) -> Result<ShippingAddress, ApiError> {
        let url = self.endpoint(&["addresses", &id.to_string()])?;
        self.send_json(self.request(Method::PUT, url, Some(token)).json(address))
            .await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_address(&self, token: &AuthToken, id: AddressId) -> Result<(), ApiError> {
        let url = self.endpoint(&["addresses", &id.to_string()])?;
        self.send_empty(self.request(Method::DELETE, url, Some(token)))
            .await
    }

    /// Make an address the primary one. The backend demotes the previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn make_primary_address(
        &self,
        token: &AuthToken,
        id: AddressId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["addresses", &id.to_string(), "primary"])?;
        self.send_empty(self.request(Method::POST, url, Some(token)))
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// The shopper's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn orders(&self, token: &AuthToken) -> Result<Vec<OrderRecord>, ApiError> {
        let url = self.endpoint(&["orders"])?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// Place an order. Sent exactly once; failures are reported, not retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order.
    #[instrument(skip_all)]
    pub async fn create_order(
        &self,
        token: &AuthToken,
        order: &OrderRequest,
    ) -> Result<OrderRecord, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let record: OrderRecord = self
            .send_json(self.request(Method::POST, url, Some(token)).json(order))
            .await?;
        tracing::info!(order_id = %record.id, "Order placed");
        Ok(record)
    }
}
