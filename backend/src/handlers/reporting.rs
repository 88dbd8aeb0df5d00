//! HTTP handlers for reports and dashboard endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::models::{Dashboard, LowStockCount, LowStockItem, ProductLocations};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{report_pdf, ReportingService};
use crate::AppState;

/// Query parameters for report format selection
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

/// Number of products at or below their minimum stock
pub async fn low_stock_count(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<LowStockCount>> {
    let count = state.reporting().low_stock_count().await?;
    Ok(Json(LowStockCount { count }))
}

/// Locations holding a product, with quantities
pub async fn product_locations(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ProductLocations>> {
    let locations = state.reporting().product_locations(&product_id).await?;
    Ok(Json(ProductLocations { locations }))
}

pub async fn low_stock_report(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<LowStockItem>>> {
    let items = state.reporting().low_stock_report().await?;
    Ok(Json(items))
}

pub async fn dashboard(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state.reporting().dashboard().await?;
    Ok(Json(dashboard))
}

/// Balance report as JSON, or CSV with `?format=csv`
pub async fn balance_report(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let rows = state.reporting().balance_report().await?;

    if query.format.as_deref() == Some("csv") {
        let csv_data = ReportingService::export_to_csv(&rows)?;
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"inventory_report.csv\"",
                ),
            ],
            csv_data,
        )
            .into_response());
    }

    Ok(Json(rows).into_response())
}

/// Balance report as a PDF download
pub async fn balance_report_pdf(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Response> {
    let rows = state.reporting().balance_report().await?;
    let pdf = report_pdf::render_balance_report(&rows);
    let disposition = format!("attachment; filename=\"{}\"", report_pdf::PDF_FILENAME);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}
