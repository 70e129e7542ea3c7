//! Bazaar Core - Shared domain types and checkout logic.
//!
//! This crate provides the types used across all Bazaar components:
//! - `storefront` - Public-facing shop, cart and checkout
//! - `admin` - Catalog and order administration dashboard
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. The REST backend is the source of truth; everything here either
//! mirrors its payloads or runs entirely in memory between requests.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails and statuses
//! - [`cart`] - Cart line items and derived totals
//! - [`address`] - Saved shipping addresses
//! - [`catalog`] - Products, categories, reviews and banners
//! - [`payment`] - Payment details and per-method validation
//! - [`summary`] - Order summary computation (subtotal, fees, total)
//! - [`order`] - Order payloads and records
//! - [`checkout`] - The four step checkout wizard

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod payment;
pub mod summary;
pub mod types;

pub use address::{AddressInput, ShippingAddress};
pub use cart::{Cart, CartItem, ProductRef};
pub use catalog::{
    Banner, BannerInput, Category, CategoryInput, Product, ProductInput, Review, ReviewInput, User,
    active_banners,
};
pub use checkout::{
    CheckoutError, CheckoutMode, CheckoutStep, CheckoutWizard, OrderConfirmation, ShippingForm,
};
pub use order::{OrderLine, OrderRecord, OrderRequest, OrderSource};
pub use payment::{CardDetails, PaymentDetails, PaymentError, PaymentMethod, Wallet};
pub use summary::{OrderSummary, SummaryRules};
pub use types::*;
