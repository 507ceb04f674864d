use sqlx::PgPool;
use uuid::Uuid;

use crate::products::dto::{CreateProductRequest, UpdateProductRequest};
use crate::products::repo_types::Product;

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, category, size, color, \
                               stock, created_at, updated_at";

impl Product {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at"
        ))
        .fetch_all(db)
        .await?;
        Ok(products)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    /// Case-insensitive substring match over name, description, category
    /// and color.
    pub async fn search(db: &PgPool, term: &str) -> anyhow::Result<Vec<Product>> {
        let pattern = format!("%{term}%");
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE name ILIKE $1
                OR description ILIKE $1
                OR category ILIKE $1
                OR color ILIKE $1
             ORDER BY created_at"
        ))
        .bind(pattern)
        .fetch_all(db)
        .await?;
        Ok(products)
    }

    pub async fn create(db: &PgPool, request: &CreateProductRequest) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, description, price, image_url, category, size, color, stock)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price)
        .bind(&request.image_url)
        .bind(&request.category)
        .bind(&request.size)
        .bind(&request.color)
        .bind(request.stock)
        .fetch_one(db)
        .await?;
        Ok(product)
    }

    /// Partial update; absent fields keep their stored value.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        request: &UpdateProductRequest,
    ) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 price = COALESCE($4, price),
                 image_url = COALESCE($5, image_url),
                 category = COALESCE($6, category),
                 size = COALESCE($7, size),
                 color = COALESCE($8, color),
                 stock = COALESCE($9, stock),
                 updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price)
        .bind(&request.image_url)
        .bind(&request.category)
        .bind(&request.size)
        .bind(&request.color)
        .bind(request.stock)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }
}

/// Deleting a product that still sits in a cart trips the RESTRICT foreign
/// key; surfaced as a conflict rather than an internal error.
pub fn is_foreign_key_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|d| d.is_foreign_key_violation())
        .unwrap_or(false)
}
