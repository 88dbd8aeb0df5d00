//! Route definitions for the stock ledger API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes
        .merge(report_routes(state.clone()))
        .nest("/products", product_routes(state.clone()))
        .nest("/locations", location_routes(state.clone()))
        .nest("/movements", movement_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(handlers::login))
}

/// Reports, dashboard and the JSON endpoints used by the UI (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/low-stock-count", get(handlers::low_stock_count))
        .route(
            "/product-locations/:product_id",
            get(handlers::product_locations),
        )
        .route("/low-stock", get(handlers::low_stock_report))
        .route("/dashboard", get(handlers::dashboard))
        .route("/report", get(handlers::balance_report))
        .route("/report/pdf", get(handlers::balance_report_pdf))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product management routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/stock", get(handlers::get_product_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Location management routes (protected)
fn location_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route(
            "/:location_id",
            put(handlers::update_location).delete(handlers::delete_location),
        )
        .route(
            "/:location_id/products/:product_id/balance",
            get(handlers::get_location_balance),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Movement ledger routes (protected)
fn movement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::record_movement),
        )
        .route(
            "/:movement_id",
            delete(handlers::delete_movement),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
