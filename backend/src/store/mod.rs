//! Persistence for the ledger
//!
//! `LedgerStore` is the seam between the services and storage. Two
//! implementations exist:
//!
//! - [`PgLedgerStore`]: PostgreSQL via sqlx, used in production.
//! - [`MemoryLedgerStore`]: process-local tables behind a `RwLock`, used for
//!   development and tests.
//!
//! Balances are never stored. Every balance is a sum over the movements, and
//! stores only have to answer aggregate questions about them
//! ([`LedgerStore::sum_quantity`], [`LedgerStore::location_flows`],
//! [`LedgerStore::product_flows`]).

mod memory;
mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;
use shared::ledger::{LocationFlow, MovementFilter, ProductFlow};
use shared::models::{
    EntityUpdate, Location, LocationDeletion, Movement, MovementView, NewMovement, NewProduct,
    NewUser, Product, StoredUser, User,
};

use crate::error::{AppError, AppResult};

/// Availability requirement checked atomically with a movement insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockGuard {
    pub location_id: String,
    pub requested: i64,
}

impl StockGuard {
    /// Fails when `available` cannot cover the requested quantity
    pub fn check(&self, available: i64) -> AppResult<()> {
        if self.requested > available {
            return Err(AppError::InsufficientStock {
                location_id: self.location_id.clone(),
                available,
                requested: self.requested,
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Short name for logs and the health endpoint
    fn backend_name(&self) -> &'static str;

    async fn ping(&self) -> AppResult<()>;

    // Products (ordered by creation)
    async fn list_products(&self) -> AppResult<Vec<Product>>;
    async fn find_product(&self, product_id: &str) -> AppResult<Option<Product>>;
    async fn insert_product(&self, product: NewProduct) -> AppResult<Product>;
    async fn update_product(
        &self,
        product_id: &str,
        update: EntityUpdate,
    ) -> AppResult<Option<Product>>;
    /// Removes the product and its movements; returns the number of movements removed
    async fn delete_product_cascade(&self, product_id: &str) -> AppResult<Option<u64>>;

    // Locations (ordered by creation)
    async fn list_locations(&self) -> AppResult<Vec<Location>>;
    async fn find_location(&self, location_id: &str) -> AppResult<Option<Location>>;
    async fn insert_location(&self, location: EntityUpdate) -> AppResult<Location>;
    async fn update_location(
        &self,
        location_id: &str,
        update: EntityUpdate,
    ) -> AppResult<Option<Location>>;
    async fn delete_location(&self, location_id: &str) -> AppResult<LocationDeletion>;

    // Movements
    /// Appends a movement. With a guard, the source balance is computed and
    /// checked in the same atomic unit as the insert.
    async fn append_movement(
        &self,
        movement: NewMovement,
        guard: Option<StockGuard>,
    ) -> AppResult<Movement>;
    async fn delete_movement(&self, movement_id: i64) -> AppResult<bool>;
    async fn count_movements(&self) -> AppResult<i64>;
    /// Newest first, joined with product and location names
    async fn movement_history(&self) -> AppResult<Vec<MovementView>>;
    async fn sum_quantity(&self, filter: &MovementFilter) -> AppResult<i64>;
    /// Grouped per (product, location); optionally limited to one product
    async fn location_flows(&self, product_id: Option<&str>) -> AppResult<Vec<LocationFlow>>;
    async fn product_flows(&self) -> AppResult<Vec<ProductFlow>>;

    // Users
    async fn count_users(&self) -> AppResult<i64>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<StoredUser>>;
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;
}
