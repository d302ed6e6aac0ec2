use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::ProductRecord;
use crate::domain::products::NewProduct;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProductParams {
    pub id: i64,
    pub fields: NewProduct,
}

/// Read side of the product store.
#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<ProductRecord>, RepoError>;

    /// All products in ascending id order.
    async fn list_all(&self) -> Result<Vec<ProductRecord>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Write side of the product store.
#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    /// Insert a row and return the id the store assigned.
    async fn insert_product(&self, fields: NewProduct) -> Result<i64, RepoError>;

    /// Overwrite the mutable fields and bump `updated_at`.
    async fn update_product(&self, params: UpdateProductParams) -> Result<(), RepoError>;

    /// Remove a row. Removing an absent id is not an error.
    async fn delete_product(&self, id: i64) -> Result<(), RepoError>;
}
