use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    cart::{
        dto::{
            validate_quantity, AddToCartRequest, CartItemResponse, CartItemView, CartResponse,
            UpdateCartItemRequest,
        },
        service,
    },
    error::ApiError,
    state::AppState,
    users::dto::MessageResponse,
};

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/:user_id", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update/:cart_item_id", put(update_cart_item))
        .route("/cart/remove/:cart_item_id", delete(remove_cart_item))
        .route("/cart/checkout", post(checkout))
}

#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    auth.require_self_or_admin(user_id)?;
    let (cart, items) = service::get_cart(&state.db, user_id).await?;
    Ok(Json(CartResponse {
        user_id,
        cart_id: cart.map(|c| c.id),
        items: items.into_iter().map(CartItemView::from).collect(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Json<CartItemResponse>, ApiError> {
    if let Some(msg) = validate_quantity(payload.quantity) {
        return Err(ApiError::Validation(vec![msg]));
    }
    let cart_item =
        service::add_item(&state.db, auth.id, payload.product_id, payload.quantity).await?;
    Ok(Json(CartItemResponse {
        message: "item added to cart".to_string(),
        cart_item,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(cart_item_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<Json<CartItemResponse>, ApiError> {
    if let Some(msg) = validate_quantity(payload.quantity) {
        return Err(ApiError::Validation(vec![msg]));
    }
    let cart_item =
        service::update_item(&state.db, &auth, cart_item_id, payload.quantity).await?;
    Ok(Json(CartItemResponse {
        message: "cart item quantity updated".to_string(),
        cart_item,
    }))
}

#[instrument(skip(state))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(cart_item_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    service::remove_item(&state.db, &auth, cart_item_id).await?;
    Ok(Json(MessageResponse {
        message: "item removed from cart".to_string(),
    }))
}

#[instrument(skip(state))]
pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    service::checkout(&state.db, auth.id).await?;
    Ok(Json(MessageResponse {
        message: "checkout complete, cart emptied".to_string(),
    }))
}
