use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One cart per user, created lazily on the first add and kept across
/// checkouts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// A (product, quantity) line within a cart.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: OffsetDateTime,
}

/// Cart line joined with the product snapshot fields the storefront shows.
#[derive(Debug, Clone, FromRow)]
pub struct CartItemRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
}
