//! Cart mutations. Every stock-sensitive path runs in a transaction holding
//! a `FOR UPDATE` lock on the product row, so two concurrent adds for the
//! same product cannot both pass the stock check and oversell.

use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::cart::repo_types::{Cart, CartItem, CartItemRow};
use crate::error::ApiError;
use crate::products::repo_types::Product;

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, category, size, color, \
                               stock, created_at, updated_at";
const CART_ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, created_at";

/// Cart line plus the owner and product facts the mutation checks need.
#[derive(Debug, FromRow)]
struct ItemForMutation {
    id: Uuid,
    owner_id: Uuid,
    product_name: String,
    stock: i32,
}

pub async fn get_cart(
    db: &PgPool,
    user_id: Uuid,
) -> Result<(Option<Cart>, Vec<CartItemRow>), ApiError> {
    let cart = sqlx::query_as::<_, Cart>(
        "SELECT id, user_id, created_at FROM carts WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    let Some(cart) = cart else {
        return Ok((None, Vec::new()));
    };

    let items = sqlx::query_as::<_, CartItemRow>(
        "SELECT ci.id, ci.product_id, ci.quantity, p.name, p.price, p.image_url, p.stock
         FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.cart_id = $1
         ORDER BY ci.created_at",
    )
    .bind(cart.id)
    .fetch_all(db)
    .await?;

    Ok((Some(cart), items))
}

/// Adds a product to the user's cart, creating the cart lazily. The combined
/// quantity (existing line plus the request) is validated against stock under
/// the product lock; on success the line is upserted, incrementing any
/// existing quantity.
pub async fn add_item(
    db: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<CartItem, ApiError> {
    let mut tx = db.begin().await?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("product"))?;

    let cart = sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (user_id) VALUES ($1)
         ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
         RETURNING id, user_id, created_at",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let existing: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart.id)
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;

    let combined = i64::from(existing.map_or(0, |(q,)| q)) + i64::from(quantity);
    if combined > i64::from(product.stock) {
        // Dropping the transaction rolls back; nothing was mutated.
        return Err(ApiError::InsufficientStock {
            name: product.name,
            available: product.stock,
        });
    }

    let item = sqlx::query_as::<_, CartItem>(&format!(
        "INSERT INTO cart_items (cart_id, product_id, quantity)
         VALUES ($1, $2, $3)
         ON CONFLICT (cart_id, product_id)
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
         RETURNING {CART_ITEM_COLUMNS}"
    ))
    .bind(cart.id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(user_id = %user_id, product_id = %product_id, quantity, "cart item added");
    Ok(item)
}

/// Overwrites a line's quantity after ownership and stock checks.
pub async fn update_item(
    db: &PgPool,
    actor: &AuthUser,
    cart_item_id: Uuid,
    quantity: i32,
) -> Result<CartItem, ApiError> {
    let mut tx = db.begin().await?;

    let item = sqlx::query_as::<_, ItemForMutation>(
        "SELECT ci.id, c.user_id AS owner_id, p.name AS product_name, p.stock
         FROM cart_items ci
         JOIN carts c ON c.id = ci.cart_id
         JOIN products p ON p.id = ci.product_id
         WHERE ci.id = $1
         FOR UPDATE",
    )
    .bind(cart_item_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("cart item"))?;

    actor.require_self_or_admin(item.owner_id)?;

    if quantity > item.stock {
        return Err(ApiError::InsufficientStock {
            name: item.product_name,
            available: item.stock,
        });
    }

    let updated = sqlx::query_as::<_, CartItem>(&format!(
        "UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING {CART_ITEM_COLUMNS}"
    ))
    .bind(item.id)
    .bind(quantity)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(actor = %actor.id, cart_item_id = %cart_item_id, quantity, "cart item updated");
    Ok(updated)
}

/// Deletes a line once the actor is its owner or an admin.
pub async fn remove_item(
    db: &PgPool,
    actor: &AuthUser,
    cart_item_id: Uuid,
) -> Result<(), ApiError> {
    let owner: Option<(Uuid,)> = sqlx::query_as(
        "SELECT c.user_id
         FROM cart_items ci
         JOIN carts c ON c.id = ci.cart_id
         WHERE ci.id = $1",
    )
    .bind(cart_item_id)
    .fetch_optional(db)
    .await?;

    let (owner_id,) = owner.ok_or(ApiError::NotFound("cart item"))?;
    actor.require_self_or_admin(owner_id)?;

    sqlx::query("DELETE FROM cart_items WHERE id = $1")
        .bind(cart_item_id)
        .execute(db)
        .await?;

    info!(actor = %actor.id, cart_item_id = %cart_item_id, "cart item removed");
    Ok(())
}

/// Empties the cart; the cart row itself is kept for reuse. A missing or
/// already-empty cart is not found. Stock is not debited here, only
/// validated at add/update time.
pub async fn checkout(db: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
    let cart = sqlx::query_as::<_, Cart>(
        "SELECT id, user_id, created_at FROM carts WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or(ApiError::NotFound("cart"))?;

    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("cart"));
    }

    info!(user_id = %user_id, items = result.rows_affected(), "checkout cleared cart");
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::products::dto::CreateProductRequest;
    use crate::users::repo_types::{Role, User};

    async fn seed_user(db: &PgPool, email: &str) -> User {
        User::create(db, "Test Shopper", email, "not-a-real-hash")
            .await
            .expect("create user")
    }

    async fn seed_product(db: &PgPool, stock: i32) -> Product {
        Product::create(
            db,
            &CreateProductRequest {
                name: "Linen Shirt".into(),
                description: Some("A light summer linen shirt".into()),
                price: Decimal::new(4990, 2),
                image_url: None,
                category: Some("shirts".into()),
                size: Some("M".into()),
                color: Some("white".into()),
                stock,
            },
        )
        .await
        .expect("create product")
    }

    fn visitor(id: Uuid) -> AuthUser {
        AuthUser {
            id,
            role: Role::Visitor,
        }
    }

    #[sqlx::test]
    async fn repeated_add_validates_combined_quantity_against_stock(pool: PgPool) {
        let user = seed_user(&pool, "shopper@example.com").await;
        let product = seed_product(&pool, 5).await;

        let item = add_item(&pool, user.id, product.id, 3)
            .await
            .expect("first add fits the stock");
        assert_eq!(item.quantity, 3);

        // 3 already in the cart plus 3 more exceeds stock 5.
        let err = add_item(&pool, user.id, product.id, 3)
            .await
            .expect_err("combined quantity exceeds stock");
        assert!(matches!(
            err,
            ApiError::InsufficientStock { available: 5, .. }
        ));

        let (_, items) = get_cart(&pool, user.id).await.expect("get cart");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[sqlx::test]
    async fn add_within_stock_increments_the_existing_line(pool: PgPool) {
        let user = seed_user(&pool, "shopper@example.com").await;
        let product = seed_product(&pool, 5).await;

        add_item(&pool, user.id, product.id, 2).await.expect("add");
        let item = add_item(&pool, user.id, product.id, 3)
            .await
            .expect("second add still fits");
        assert_eq!(item.quantity, 5);

        let (_, items) = get_cart(&pool, user.id).await.expect("get cart");
        assert_eq!(items.len(), 1);
    }

    #[sqlx::test]
    async fn add_of_missing_product_is_not_found(pool: PgPool) {
        let user = seed_user(&pool, "shopper@example.com").await;
        let err = add_item(&pool, user.id, Uuid::new_v4(), 1)
            .await
            .expect_err("no such product");
        assert!(matches!(err, ApiError::NotFound("product")));
    }

    #[sqlx::test]
    async fn checkout_clears_items_without_touching_stock(pool: PgPool) {
        let user = seed_user(&pool, "shopper@example.com").await;
        let product = seed_product(&pool, 5).await;
        add_item(&pool, user.id, product.id, 3).await.expect("add");

        let removed = checkout(&pool, user.id).await.expect("checkout");
        assert_eq!(removed, 1);

        let (cart, items) = get_cart(&pool, user.id).await.expect("get cart");
        assert!(cart.is_some(), "cart row persists for reuse");
        assert!(items.is_empty());

        let stored = Product::find_by_id(&pool, product.id)
            .await
            .expect("lookup")
            .expect("product exists");
        assert_eq!(stored.stock, 5, "checkout must not debit stock");
    }

    #[sqlx::test]
    async fn checkout_of_missing_or_empty_cart_is_not_found(pool: PgPool) {
        let user = seed_user(&pool, "shopper@example.com").await;
        let err = checkout(&pool, user.id).await.expect_err("no cart yet");
        assert!(matches!(err, ApiError::NotFound("cart")));

        let product = seed_product(&pool, 5).await;
        add_item(&pool, user.id, product.id, 1).await.expect("add");
        checkout(&pool, user.id).await.expect("first checkout");

        let err = checkout(&pool, user.id)
            .await
            .expect_err("cart is already empty");
        assert!(matches!(err, ApiError::NotFound("cart")));
    }

    #[sqlx::test]
    async fn update_and_remove_enforce_ownership_and_stock(pool: PgPool) {
        let owner = seed_user(&pool, "owner@example.com").await;
        let stranger = seed_user(&pool, "stranger@example.com").await;
        let product = seed_product(&pool, 5).await;
        let item = add_item(&pool, owner.id, product.id, 2).await.expect("add");

        let err = update_item(&pool, &visitor(stranger.id), item.id, 4)
            .await
            .expect_err("stranger may not update");
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = update_item(&pool, &visitor(owner.id), item.id, 6)
            .await
            .expect_err("beyond stock");
        assert!(matches!(err, ApiError::InsufficientStock { .. }));

        let updated = update_item(&pool, &visitor(owner.id), item.id, 4)
            .await
            .expect("owner update within stock");
        assert_eq!(updated.quantity, 4);

        let admin = AuthUser {
            id: stranger.id,
            role: Role::Admin,
        };
        remove_item(&pool, &admin, item.id)
            .await
            .expect("admin override removes");
        let err = remove_item(&pool, &visitor(owner.id), item.id)
            .await
            .expect_err("already gone");
        assert!(matches!(err, ApiError::NotFound("cart item")));
    }
}
