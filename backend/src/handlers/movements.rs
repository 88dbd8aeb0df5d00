//! HTTP handlers for the movement ledger

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::models::{Movement, MovementView, RecordMovementInput};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Movement history, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<MovementView>>> {
    let history = state.reporting().movement_history().await?;
    Ok(Json(history))
}

/// Record an inflow, outflow or transfer
pub async fn record_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<(StatusCode, Json<Movement>)> {
    let movement = state.ledger().record_movement(input).await?;
    tracing::debug!(
        user = %current_user.0.username,
        movement_id = movement.movement_id,
        "Movement added"
    );
    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn delete_movement(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(movement_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.ledger().delete_movement(movement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
