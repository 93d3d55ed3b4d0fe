use thiserror::Error;

use crate::db_types::Product;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Read-only access to product prices. Products that don't exist are simply absent from the result.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn fetch_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, CatalogError>;
}
