//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart mutations followed by a full refetch
//! - `checkout` - Session storage for the checkout wizard
//! - `flash` - One-shot notices shown on the next rendered page

pub mod cart;
pub mod checkout;
pub mod flash;

pub use cart::{CartSync, Synced};
pub use flash::{Flash, FlashKind};
