//! Catalog endpoints: products, categories, banners and reviews.

use bazaar_core::{Banner, Category, CategoryId, Product, ProductId, Review, ReviewInput};
use reqwest::Method;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, AuthToken, BackendClient};

impl BackendClient {
    /// List products, optionally filtered by search text and category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        query: Option<&str>,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, ApiError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let cache_key = CacheKey::Products {
            query: query.map(str::to_lowercase),
            category,
        };

        if let Some(CacheValue::Products(products)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.endpoint(&["products"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(q) = query {
                pairs.append_pair("q", q);
            }
            if let Some(category) = category {
                pairs.append_pair("category", &category.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let products: Vec<Product> = self.send_json(self.request(Method::GET, url, None)).await?;

        self.cache()
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", &id.to_string()])?;
        let product: Product = self.send_json(self.request(Method::GET, url, None)).await?;

        self.cache()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache().get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["categories"])?;
        let categories: Vec<Category> = self.send_json(self.request(Method::GET, url, None)).await?;

        self.cache()
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// List home page banners as the backend returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        if let Some(CacheValue::Banners(banners)) = self.cache().get(&CacheKey::Banners).await {
            return Ok(banners);
        }

        let url = self.endpoint(&["banners"])?;
        let banners: Vec<Banner> = self.send_json(self.request(Method::GET, url, None)).await?;

        self.cache()
            .insert(CacheKey::Banners, CacheValue::Banners(banners.clone()))
            .await;

        Ok(banners)
    }

    /// Reviews for a product, newest first as the backend orders them.
    ///
    /// Not cached, so a freshly posted review shows up immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn reviews(&self, id: ProductId) -> Result<Vec<Review>, ApiError> {
        let url = self.endpoint(&["products", &id.to_string(), "reviews"])?;
        self.send_json(self.request(Method::GET, url, None)).await
    }

    /// Post a review as the logged-in shopper.
    ///
    /// Drops the cached product so its rating refreshes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the review.
    #[instrument(skip(self, token, review), fields(product_id = %id, rating = review.rating))]
    pub async fn post_review(
        &self,
        token: &AuthToken,
        id: ProductId,
        review: &ReviewInput,
    ) -> Result<Review, ApiError> {
        let url = self.endpoint(&["products", &id.to_string(), "reviews"])?;
        let created = self
            .send_json(self.request(Method::POST, url, Some(token)).json(review))
            .await?;
        self.invalidate_product(id).await;
        Ok(created)
    }

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, id: ProductId) {
        self.cache().invalidate(&CacheKey::Product(id)).await;
    }
}
