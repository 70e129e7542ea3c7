//! Cache types for catalog responses.

use bazaar_core::{Banner, Category, CategoryId, Product, ProductId};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products {
        query: Option<String>,
        category: Option<CategoryId>,
    },
    Categories,
    Banners,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
    Banners(Vec<Banner>),
}
