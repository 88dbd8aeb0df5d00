//! Stock ledger service
//!
//! Tracks products moving between storage locations. Stock levels are never
//! stored: they are derived from an append-only ledger of movements. The HTTP
//! API exposes the catalog, the ledger, low-stock and balance reports (JSON,
//! CSV and PDF).

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use config::StorageBackend;
use services::{AuthService, CatalogService, LedgerService, Notifier, ReportingService};
use store::{LedgerStore, MemoryLedgerStore, PgLedgerStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        Self {
            store,
            notifier,
            config: Arc::new(config),
        }
    }

    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(self.store.clone(), self.notifier.clone())
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.store.clone(), self.ledger(), &self.config.inventory)
    }

    pub fn reporting(&self) -> ReportingService {
        ReportingService::new(self.store.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.store.clone(), &self.config.auth)
    }
}

/// Connect the configured store, prepare it and build the application state
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let store: Arc<dyn LedgerStore> = match config.database.backend {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            if config.database.run_migrations {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Migrations completed");
            }

            Arc::new(PgLedgerStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let notifier = services::notification::from_config(&config.notification)?;
    let state = AppState::new(store, notifier, config);

    state.auth().ensure_admin(&state.config.admin).await?;

    if state.config.inventory.seed_demo_data {
        state.catalog().seed_demo_data().await?;
    }

    Ok(state)
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Stock Ledger API v1.0"
}
