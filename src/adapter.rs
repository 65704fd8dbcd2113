use crate::product::Product;
use async_trait::async_trait;
use thiserror::Error;

/// E-commerce platform abstraction.
///
/// One implementation per backing shop platform (PrestaShop today); the
/// service layer only ever talks to this trait.
#[async_trait]
pub trait EcommerceAdapter: Send + Sync {
    /// Retrieve a single product by id. `Ok(None)` means the platform knows
    /// no such product.
    async fn get_product(&self, product_id: &str) -> Result<Option<Product>, AdapterError>;

    /// Retrieve up to `limit` products from one category.
    async fn get_products_by_category(
        &self,
        category_id: &str,
        limit: usize,
    ) -> Result<Vec<Product>, AdapterError>;

    /// Verify API connectivity and credentials.
    async fn health_check(&self) -> bool;
}

/// Transport or protocol failure talking to the shop platform. Anything
/// merely malformed inside an otherwise valid response is skipped during
/// parsing instead of failing the whole request.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("e-commerce API request failed: {0}")]
    Http(#[from] reqwest::Error),
}
