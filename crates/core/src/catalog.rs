//! Catalog entities: products, categories, reviews and banners.
//!
//! Each entity comes with an `*Input` type, the body the admin dashboard
//! sends when creating or updating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BannerId, CategoryId, Email, Money, ProductId, ReviewId, UserId, UserRole};

/// A product listed in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Average rating, 0 when unrated.
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Body for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: rust_decimal::Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

/// Body for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

/// A shopper's review of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Body for posting a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub rating: u8,
    pub comment: String,
}

impl ReviewInput {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    /// Validate and normalize a review.
    ///
    /// # Errors
    ///
    /// Returns a message for ratings outside 1-5 or a blank comment.
    pub fn validated(rating: u8, comment: &str) -> Result<Self, &'static str> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&rating) {
            return Err("rating must be between 1 and 5");
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Err("comment cannot be empty");
        }
        Ok(Self {
            rating,
            comment: comment.to_owned(),
        })
    }
}

/// A promotional banner on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub position: i32,
}

/// Body for creating or updating a banner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BannerInput {
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub position: i32,
}

/// Active banners ordered by position.
#[must_use]
pub fn active_banners(mut banners: Vec<Banner>) -> Vec<Banner> {
    banners.retain(|banner| banner.active);
    banners.sort_by_key(|banner| banner.position);
    banners
}

/// A backend user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn banner(id: i64, position: i32, active: bool) -> Banner {
        Banner {
            id: BannerId::new(id),
            title: format!("Banner {id}"),
            image_url: format!("/img/{id}.jpg"),
            link: None,
            active,
            position,
        }
    }

    #[test]
    fn test_active_banners_sorted() {
        let banners = vec![banner(1, 3, true), banner(2, 1, false), banner(3, 2, true)];
        let ids: Vec<i64> = active_banners(banners)
            .iter()
            .map(|b| b.id.as_i64())
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_review_validation() {
        assert!(ReviewInput::validated(0, "ok").is_err());
        assert!(ReviewInput::validated(6, "ok").is_err());
        assert!(ReviewInput::validated(4, "   ").is_err());
        let review = ReviewInput::validated(5, "  Lovely tea ").unwrap();
        assert_eq!(review.comment, "Lovely tea");
    }

    #[test]
    fn test_product_defaults() {
        let product: Product = serde_json::from_str(
            r#"{"id": 1, "name": "Tea", "slug": "tea", "price": {"amount": "120.00"}}"#,
        )
        .unwrap();
        assert!(!product.in_stock());
        assert!(product.primary_image().is_none());
        assert_eq!(product.review_count, 0);
    }

    #[test]
    fn test_admin_role() {
        let user: User = serde_json::from_str(
            r#"{"id": 1, "name": "Ops", "email": "ops@bazaar.in", "role": "admin"}"#,
        )
        .unwrap();
        assert!(user.is_admin());
    }
}
