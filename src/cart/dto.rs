use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::repo_types::{CartItem, CartItemRow};

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// Zero and negative quantities are rejected outright; removal has its own
/// endpoint.
pub fn validate_quantity(quantity: i32) -> Option<String> {
    if quantity < 1 {
        Some("quantity must be at least 1".to_string())
    } else {
        None
    }
}

#[derive(Debug, Serialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: Uuid,
    pub quantity: i32,
    pub product: ProductSnapshot,
}

impl From<CartItemRow> for CartItemView {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            quantity: row.quantity,
            product: ProductSnapshot {
                id: row.product_id,
                name: row.name,
                price: row.price,
                image_url: row.image_url,
                stock: row.stock,
            },
        }
    }
}

/// A user with no cart row still gets this shape, with `cart_id: null` and
/// an empty item list.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub user_id: Uuid,
    pub cart_id: Option<Uuid>,
    pub items: Vec<CartItemView>,
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub message: String,
    pub cart_item: CartItem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(1).is_none());
        assert!(validate_quantity(25).is_none());
        assert!(validate_quantity(0).is_some());
        assert!(validate_quantity(-3).is_some());
    }

    #[test]
    fn empty_cart_shape_serializes_with_null_cart_id() {
        let response = CartResponse {
            user_id: Uuid::new_v4(),
            cart_id: None,
            items: Vec::new(),
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json["cart_id"].is_null());
        assert_eq!(json["items"].as_array().map(Vec::len), Some(0));
    }
}
