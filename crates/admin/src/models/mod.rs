//! Domain models for admin.

pub mod page;
pub mod session;

pub use page::Page;
pub use session::{CurrentAdmin, keys as session_keys};
