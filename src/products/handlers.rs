use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    products::{
        dto::{CreateProductRequest, UpdateProductRequest},
        repo::is_foreign_key_violation,
        repo_types::Product,
    },
    state::AppState,
    users::dto::MessageResponse,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/search/:term", get(search_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = Product::list(&state.db).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = Product::search(&state.db, &term).await?;
    Ok(Json(products))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    auth.require_admin()?;

    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let product = Product::create(&state.db, &payload).await?;
    info!(product_id = %product.id, actor = %auth.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    auth.require_admin()?;

    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let product = Product::update(&state.db, id, &payload)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    info!(product_id = %product.id, actor = %auth.id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth.require_admin()?;

    match Product::delete(&state.db, id).await {
        Ok(Some(product)) => {
            info!(product_id = %product.id, actor = %auth.id, "product deleted");
            Ok(Json(MessageResponse {
                message: format!("product {} deleted", product.name),
            }))
        }
        Ok(None) => Err(ApiError::NotFound("product")),
        Err(e) if is_foreign_key_violation(&e) => {
            warn!(product_id = %id, "delete blocked by cart reference");
            Err(ApiError::Conflict(
                "product is still referenced by a cart".into(),
            ))
        }
        Err(e) => Err(ApiError::Internal(e)),
    }
}
