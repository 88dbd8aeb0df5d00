//! HTTP handlers for location endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::models::{Location, LocationInput};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Serialize)]
pub struct LocationBalance {
    pub product_id: String,
    pub location_id: String,
    pub balance: i64,
}

pub async fn list_locations(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<Location>>> {
    let locations = state.catalog().list_locations().await?;
    Ok(Json(locations))
}

pub async fn create_location(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<LocationInput>,
) -> AppResult<(StatusCode, Json<Location>)> {
    let location = state.catalog().create_location(input).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn update_location(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(location_id): Path<String>,
    Json(input): Json<LocationInput>,
) -> AppResult<Json<Location>> {
    let location = state.catalog().update_location(&location_id, input).await?;
    Ok(Json(location))
}

/// Delete a location; 409 while movements reference it
pub async fn delete_location(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(location_id): Path<String>,
) -> AppResult<StatusCode> {
    state.catalog().delete_location(&location_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stock of one product held at one location
pub async fn get_location_balance(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((location_id, product_id)): Path<(String, String)>,
) -> AppResult<Json<LocationBalance>> {
    let balance = state
        .ledger()
        .location_balance(&product_id, &location_id)
        .await?;
    Ok(Json(LocationBalance {
        product_id,
        location_id,
        balance,
    }))
}
