use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{ProductsRepo, ProductsWriteRepo, RepoError, UpdateProductParams},
    domain::entities::{Price, ProductRecord},
    domain::products::NewProduct,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price_cents: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ProductRow> for ProductRecord {
    type Error = RepoError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::from_cents(row.price_cents).map_err(|err| RepoError::Integrity {
            message: format!("product {} has an unusable price: {err}", row.id),
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, description, price_cents, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ProductRecord::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<ProductRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, description, price_cents, created_at, updated_at
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ProductRecord::try_from).collect()
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        PostgresRepositories::health_check(self)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ProductsWriteRepo for PostgresRepositories {
    async fn insert_product(&self, fields: NewProduct) -> Result<i64, RepoError> {
        let NewProduct {
            name,
            description,
            price,
        } = fields;

        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO products (name, description, price_cents, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(price.cents())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_product(&self, params: UpdateProductParams) -> Result<(), RepoError> {
        let UpdateProductParams { id, fields } = params;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2,
                description = $3,
                price_cents = $4,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.description)
        .bind(fields.price.cents())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: i64) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
