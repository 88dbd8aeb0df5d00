use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use shared::ledger::{self, BalanceQuery, LocationFlow, MovementFilter, ProductFlow};
use shared::models::{
    EntityUpdate, Location, LocationDeletion, Movement, MovementView, NewMovement, NewProduct,
    NewUser, Product, StoredUser, User,
};
use shared::IdKind;
use uuid::Uuid;

use super::{LedgerStore, StockGuard};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    locations: Vec<Location>,
    movements: Vec<Movement>,
    users: Vec<StoredUser>,
    product_seq: i64,
    location_seq: i64,
    movement_seq: i64,
}

impl Tables {
    fn product_name(&self, product_id: &str) -> Option<&str> {
        self.products
            .iter()
            .find(|p| p.product_id == product_id)
            .map(|p| p.name.as_str())
    }

    fn location_name(&self, location_id: Option<&str>) -> Option<String> {
        let location_id = location_id?;
        self.locations
            .iter()
            .find(|l| l.location_id == location_id)
            .map(|l| l.name.clone())
    }

    fn has_location(&self, location_id: Option<&str>) -> bool {
        location_id.map_or(true, |id| self.locations.iter().any(|l| l.location_id == id))
    }
}

/// In-memory ledger store.
///
/// Intended for tests/dev. A single write lock covers the availability check
/// and the insert of a guarded movement.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("ledger tables lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("ledger tables lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        self.read().map(|_| ())
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        Ok(self.read()?.products.clone())
    }

    async fn find_product(&self, product_id: &str) -> AppResult<Option<Product>> {
        Ok(self
            .read()?
            .products
            .iter()
            .find(|p| p.product_id == product_id)
            .cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        let mut tables = self.write()?;
        tables.product_seq += 1;
        let seq = tables.product_seq;

        let product = Product {
            product_id: IdKind::Product.format(seq),
            name: product.name,
            description: product.description,
            min_stock: product.min_stock,
            seq,
        };
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        product_id: &str,
        update: EntityUpdate,
    ) -> AppResult<Option<Product>> {
        let mut tables = self.write()?;
        Ok(tables
            .products
            .iter_mut()
            .find(|p| p.product_id == product_id)
            .map(|p| {
                p.name = update.name;
                p.description = update.description;
                p.clone()
            }))
    }

    async fn delete_product_cascade(&self, product_id: &str) -> AppResult<Option<u64>> {
        let mut tables = self.write()?;
        let before = tables.products.len();
        tables.products.retain(|p| p.product_id != product_id);
        if tables.products.len() == before {
            return Ok(None);
        }

        let movements_before = tables.movements.len();
        tables.movements.retain(|m| m.product_id != product_id);
        Ok(Some((movements_before - tables.movements.len()) as u64))
    }

    async fn list_locations(&self) -> AppResult<Vec<Location>> {
        Ok(self.read()?.locations.clone())
    }

    async fn find_location(&self, location_id: &str) -> AppResult<Option<Location>> {
        Ok(self
            .read()?
            .locations
            .iter()
            .find(|l| l.location_id == location_id)
            .cloned())
    }

    async fn insert_location(&self, location: EntityUpdate) -> AppResult<Location> {
        let mut tables = self.write()?;
        tables.location_seq += 1;
        let seq = tables.location_seq;

        let location = Location {
            location_id: IdKind::Location.format(seq),
            name: location.name,
            description: location.description,
            seq,
        };
        tables.locations.push(location.clone());
        Ok(location)
    }

    async fn update_location(
        &self,
        location_id: &str,
        update: EntityUpdate,
    ) -> AppResult<Option<Location>> {
        let mut tables = self.write()?;
        Ok(tables
            .locations
            .iter_mut()
            .find(|l| l.location_id == location_id)
            .map(|l| {
                l.name = update.name;
                l.description = update.description;
                l.clone()
            }))
    }

    async fn delete_location(&self, location_id: &str) -> AppResult<LocationDeletion> {
        let mut tables = self.write()?;
        if !tables.locations.iter().any(|l| l.location_id == location_id) {
            return Ok(LocationDeletion::NotFound);
        }

        let in_use = tables.movements.iter().any(|m| {
            m.from_location.as_deref() == Some(location_id)
                || m.to_location.as_deref() == Some(location_id)
        });
        if in_use {
            return Ok(LocationDeletion::InUse);
        }

        tables.locations.retain(|l| l.location_id != location_id);
        Ok(LocationDeletion::Deleted)
    }

    async fn append_movement(
        &self,
        movement: NewMovement,
        guard: Option<StockGuard>,
    ) -> AppResult<Movement> {
        let mut tables = self.write()?;

        if tables.product_name(&movement.product_id).is_none() {
            return Err(AppError::NotFound(format!("Product {}", movement.product_id)));
        }
        for location in [&movement.from_location, &movement.to_location] {
            if !tables.has_location(location.as_deref()) {
                return Err(AppError::NotFound(format!(
                    "Location {}",
                    location.as_deref().unwrap_or_default()
                )));
            }
        }

        if let Some(guard) = guard {
            let available = BalanceQuery::at_location(&movement.product_id, &guard.location_id)
                .evaluate(&tables.movements);
            guard.check(available)?;
        }

        tables.movement_seq += 1;
        let stored = Movement {
            movement_id: tables.movement_seq,
            product_id: movement.product_id,
            from_location: movement.from_location,
            to_location: movement.to_location,
            qty: movement.qty,
            created_at: Utc::now(),
        };
        tables.movements.push(stored.clone());
        Ok(stored)
    }

    async fn delete_movement(&self, movement_id: i64) -> AppResult<bool> {
        let mut tables = self.write()?;
        let before = tables.movements.len();
        tables.movements.retain(|m| m.movement_id != movement_id);
        Ok(tables.movements.len() != before)
    }

    async fn count_movements(&self) -> AppResult<i64> {
        Ok(self.read()?.movements.len() as i64)
    }

    async fn movement_history(&self) -> AppResult<Vec<MovementView>> {
        let tables = self.read()?;
        let mut history: Vec<MovementView> = tables
            .movements
            .iter()
            .map(|m| MovementView {
                movement_id: m.movement_id,
                product_id: m.product_id.clone(),
                product_name: tables
                    .product_name(&m.product_id)
                    .unwrap_or_default()
                    .to_string(),
                from_location: m.from_location.clone(),
                from_location_name: tables.location_name(m.from_location.as_deref()),
                to_location: m.to_location.clone(),
                to_location_name: tables.location_name(m.to_location.as_deref()),
                qty: m.qty,
                kind: m.kind(),
                created_at: m.created_at,
            })
            .collect();

        history.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.movement_id.cmp(&a.movement_id))
        });
        Ok(history)
    }

    async fn sum_quantity(&self, filter: &MovementFilter) -> AppResult<i64> {
        Ok(filter.sum(&self.read()?.movements))
    }

    async fn location_flows(&self, product_id: Option<&str>) -> AppResult<Vec<LocationFlow>> {
        let tables = self.read()?;
        Ok(ledger::location_flows(
            tables
                .movements
                .iter()
                .filter(|m| product_id.map_or(true, |p| m.product_id == p)),
        ))
    }

    async fn product_flows(&self) -> AppResult<Vec<ProductFlow>> {
        Ok(ledger::product_flows(&self.read()?.movements))
    }

    async fn count_users(&self) -> AppResult<i64> {
        Ok(self.read()?.users.len() as i64)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<StoredUser>> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.user.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.user.username == user.username) {
            return Err(AppError::Conflict {
                resource: "username".to_string(),
                message: format!("User {} already exists", user.username),
            });
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            created_at: Utc::now(),
        };
        tables.users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            min_stock: 5,
        }
    }

    fn new_location(name: &str) -> EntityUpdate {
        EntityUpdate {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryLedgerStore::new();
        let first = store.insert_product(new_product("Face Wash")).await.unwrap();
        let second = store.insert_product(new_product("Serum")).await.unwrap();
        let location = store.insert_location(new_location("Main Warehouse")).await.unwrap();

        assert_eq!(first.product_id, "PROD001");
        assert_eq!(second.product_id, "PROD002");
        assert_eq!(location.location_id, "WH001");
    }

    #[tokio::test]
    async fn test_guarded_append_rejects_overdraw_without_writing() {
        let store = MemoryLedgerStore::new();
        store.insert_product(new_product("Face Wash")).await.unwrap();
        store.insert_location(new_location("Main Warehouse")).await.unwrap();

        let result = store
            .append_movement(
                NewMovement {
                    product_id: "PROD001".to_string(),
                    from_location: Some("WH001".to_string()),
                    to_location: None,
                    qty: 1,
                },
                Some(StockGuard {
                    location_id: "WH001".to_string(),
                    requested: 1,
                }),
            )
            .await;

        assert!(matches!(result, Err(AppError::InsufficientStock { available: 0, .. })));
        assert_eq!(store.count_movements().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_rejects_unknown_location() {
        let store = MemoryLedgerStore::new();
        store.insert_product(new_product("Face Wash")).await.unwrap();

        let result = store
            .append_movement(
                NewMovement {
                    product_id: "PROD001".to_string(),
                    from_location: None,
                    to_location: Some("WH404".to_string()),
                    qty: 1,
                },
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let store = MemoryLedgerStore::new();
        store.insert_product(new_product("Face Wash")).await.unwrap();
        store.insert_location(new_location("Main Warehouse")).await.unwrap();
        for qty in [5, 7] {
            store
                .append_movement(
                    NewMovement {
                        product_id: "PROD001".to_string(),
                        from_location: None,
                        to_location: Some("WH001".to_string()),
                        qty,
                    },
                    None,
                )
                .await
                .unwrap();
        }

        let history = store.movement_history().await.unwrap();
        assert_eq!(history[0].qty, 7);
        assert_eq!(history[0].to_location_name.as_deref(), Some("Main Warehouse"));
        assert_eq!(history[0].product_name, "Face Wash");
    }
}
