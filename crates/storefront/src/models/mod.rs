//! Domain models for storefront.

pub mod page;
pub mod session;

pub use page::Page;
pub use session::{CurrentUser, keys as session_keys};
