//! HTTP handlers for product endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::models::{CreateProductInput, Product, ProductSummary, UpdateProductInput};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Serialize)]
pub struct ProductStock {
    pub product_id: String,
    pub total_stock: i64,
}

/// List products with their total stock
pub async fn list_products(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<ProductSummary>>> {
    let products = state.reporting().product_list().await?;
    Ok(Json(products))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = state.catalog().create_product(input).await?;
    tracing::debug!(user = %current_user.0.username, product_id = %product.product_id, "Product added");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Get a single product
pub async fn get_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<Product>> {
    let product = state.catalog().get_product(&product_id).await?;
    Ok(Json(product))
}

/// Edit a product; `qty` sets a new total stock through an adjustment movement
pub async fn update_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(product_id): Path<String>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let product = state.catalog().update_product(&product_id, input).await?;
    Ok(Json(product))
}

/// Delete a product and its movements
pub async fn delete_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<StatusCode> {
    state.catalog().delete_product(&product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Total stock of a product across all locations
pub async fn get_product_stock(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ProductStock>> {
    let total_stock = state.ledger().total_stock(&product_id).await?;
    Ok(Json(ProductStock {
        product_id,
        total_stock,
    }))
}
