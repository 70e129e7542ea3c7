//! Business logic services for admin.
//!
//! # Services
//!
//! - `flash` - One-shot notices carried across the post/redirect/get cycle

pub mod flash;
