//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::models::{
    CreateProductInput, LocationInput, Movement, Product, RecordMovementInput,
};
use stock_ledger::config::{AdminConfig, AuthConfig, Config, DatabaseConfig, InventoryConfig};
use stock_ledger::error::AppResult;
use stock_ledger::services::{Notifier, NotifyError};
use stock_ledger::store::MemoryLedgerStore;
use stock_ledger::AppState;

pub const ADMIN_PASSWORD: &str = "admin123";

/// Config for the in-memory store with a cheap bcrypt cost
pub fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        database: DatabaseConfig::default(),
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiry_secs: 300,
            bcrypt_cost: 4,
        },
        admin: AdminConfig {
            username: "admin".to_string(),
            password: Some(ADMIN_PASSWORD.to_string()),
            email: None,
        },
        inventory: InventoryConfig::default(),
        ..Config::default()
    }
}

/// Low-stock alert captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub product_name: String,
    pub current_stock: i64,
    pub min_stock: i64,
}

/// Notifier that records alerts, optionally failing or never finishing
/// a delivery
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<Alert>>,
    fail: bool,
    stall: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Records the alert, then never completes (an unresponsive relay)
    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_low_stock(
        &self,
        product_name: &str,
        current_stock: i64,
        min_stock: i64,
    ) -> Result<(), NotifyError> {
        self.alerts.lock().unwrap().push(Alert {
            product_name: product_name.to_string(),
            current_stock,
            min_stock,
        });
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(NotifyError::Misconfigured("relay unreachable".to_string()));
        }
        Ok(())
    }
}

/// Application state over a fresh in-memory store
pub struct Harness {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::default())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        let notifier = Arc::new(notifier);
        let state = AppState::new(
            Arc::new(MemoryLedgerStore::new()),
            notifier.clone(),
            test_config(),
        );
        Self { state, notifier }
    }

    pub async fn add_product(&self, name: &str, min_stock: i64) -> Product {
        self.state
            .catalog()
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: None,
                min_stock: Some(min_stock),
                initial_qty: None,
            })
            .await
            .unwrap()
    }

    pub async fn add_location(&self, name: &str) -> String {
        self.state
            .catalog()
            .create_location(LocationInput {
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap()
            .location_id
    }

    pub async fn record(
        &self,
        product_id: &str,
        from: Option<&str>,
        to: Option<&str>,
        qty: i64,
    ) -> AppResult<Movement> {
        self.state
            .ledger()
            .record_movement(RecordMovementInput {
                product_id: product_id.to_string(),
                qty,
                from_location: from.map(str::to_string),
                to_location: to.map(str::to_string),
            })
            .await
    }

    pub async fn inflow(&self, product_id: &str, to: &str, qty: i64) -> Movement {
        self.record(product_id, None, Some(to), qty).await.unwrap()
    }

    pub async fn outflow(&self, product_id: &str, from: &str, qty: i64) -> Movement {
        self.record(product_id, Some(from), None, qty).await.unwrap()
    }

    pub async fn transfer(&self, product_id: &str, from: &str, to: &str, qty: i64) -> Movement {
        self.record(product_id, Some(from), Some(to), qty)
            .await
            .unwrap()
    }

    pub async fn total(&self, product_id: &str) -> i64 {
        self.state.ledger().total_stock(product_id).await.unwrap()
    }

    pub async fn balance(&self, product_id: &str, location_id: &str) -> i64 {
        self.state
            .ledger()
            .location_balance(product_id, location_id)
            .await
            .unwrap()
    }

    /// Alerts recorded once spawned deliveries have had a chance to run
    pub async fn settled_alerts(&self) -> Vec<Alert> {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        self.notifier.alerts()
    }

    pub async fn movement_count(&self) -> i64 {
        self.state.ledger().movement_count().await.unwrap()
    }
}
