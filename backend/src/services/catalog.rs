//! Catalog service for products and locations
//!
//! Identifiers are allocated by the store (`PROD001`, `WH001`, ...). Stock is
//! never written directly: initial quantities and edit-form adjustments become
//! movements at the receiving location, recorded through the ledger engine.

use std::sync::Arc;

use shared::models::{
    CreateProductInput, EntityUpdate, Location, LocationDeletion, LocationInput, NewProduct,
    Product, RecordMovementInput, UpdateProductInput,
};
use shared::validation::non_blank;
use tracing::instrument;
use validator::Validate;

use crate::config::InventoryConfig;
use crate::error::{AppError, AppResult};
use crate::services::LedgerService;
use crate::store::LedgerStore;

/// Catalog service for product and location maintenance
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn LedgerStore>,
    ledger: LedgerService,
    default_min_stock: i64,
    receiving_location: String,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LedgerStore>, ledger: LedgerService, config: &InventoryConfig) -> Self {
        Self {
            store,
            ledger,
            default_min_stock: config.default_min_stock,
            receiving_location: config.receiving_location.clone(),
        }
    }

    // ========================================================================
    // Products
    // ========================================================================

    pub async fn get_product(&self, product_id: &str) -> AppResult<Product> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))
    }

    /// Create a product, optionally receiving its initial stock
    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        input.validate()?;
        let name = required_name(&input.name)?;
        let initial_qty = input.initial_qty.unwrap_or(0);

        if initial_qty > 0 {
            self.require_receiving_location().await?;
        }

        let product = self
            .store
            .insert_product(NewProduct {
                name,
                description: non_blank(input.description),
                min_stock: input.min_stock.unwrap_or(self.default_min_stock),
            })
            .await?;

        tracing::info!(product_id = %product.product_id, "Product created");

        if initial_qty > 0 {
            self.ledger
                .record_movement(RecordMovementInput {
                    product_id: product.product_id.clone(),
                    qty: initial_qty,
                    from_location: None,
                    to_location: Some(self.receiving_location.clone()),
                })
                .await?;
        }

        Ok(product)
    }

    /// Edit name and description; a target `qty` books the difference
    /// against current total stock at the receiving location
    #[instrument(skip(self, input), err)]
    pub async fn update_product(
        &self,
        product_id: &str,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        input.validate()?;
        let name = required_name(&input.name)?;
        self.get_product(product_id).await?;

        if let Some(target) = input.qty {
            self.adjust_stock(product_id, target).await?;
        }

        self.store
            .update_product(
                product_id,
                EntityUpdate {
                    name,
                    description: non_blank(input.description),
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))
    }

    async fn adjust_stock(&self, product_id: &str, target: i64) -> AppResult<()> {
        let current = self.ledger.total_stock(product_id).await?;
        let diff = target
            .checked_sub(current)
            .ok_or(AppError::InvalidQuantity(target))?;
        if diff == 0 {
            return Ok(());
        }

        self.require_receiving_location().await?;
        let receiving = Some(self.receiving_location.clone());
        let (from_location, to_location) = if diff > 0 {
            (None, receiving)
        } else {
            (receiving, None)
        };

        tracing::info!(product_id, current, target, "Adjusting stock");
        self.ledger
            .record_movement(RecordMovementInput {
                product_id: product_id.to_string(),
                qty: diff.abs(),
                from_location,
                to_location,
            })
            .await?;
        Ok(())
    }

    pub async fn delete_product(&self, product_id: &str) -> AppResult<()> {
        self.ledger.delete_product(product_id).await
    }

    async fn require_receiving_location(&self) -> AppResult<()> {
        if self
            .store
            .find_location(&self.receiving_location)
            .await?
            .is_none()
        {
            return Err(AppError::validation(
                "qty",
                format!(
                    "Receiving location {} does not exist; create it before adding stock",
                    self.receiving_location
                ),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Locations
    // ========================================================================

    pub async fn list_locations(&self) -> AppResult<Vec<Location>> {
        self.store.list_locations().await
    }

    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn create_location(&self, input: LocationInput) -> AppResult<Location> {
        input.validate()?;
        let location = self
            .store
            .insert_location(EntityUpdate {
                name: required_name(&input.name)?,
                description: non_blank(input.description),
            })
            .await?;

        tracing::info!(location_id = %location.location_id, "Location created");
        Ok(location)
    }

    pub async fn update_location(
        &self,
        location_id: &str,
        input: LocationInput,
    ) -> AppResult<Location> {
        input.validate()?;
        self.store
            .update_location(
                location_id,
                EntityUpdate {
                    name: required_name(&input.name)?,
                    description: non_blank(input.description),
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location {}", location_id)))
    }

    /// Delete a location; refused while any movement references it
    #[instrument(skip(self), err)]
    pub async fn delete_location(&self, location_id: &str) -> AppResult<()> {
        match self.store.delete_location(location_id).await? {
            LocationDeletion::Deleted => {
                tracing::info!(location_id, "Location deleted");
                Ok(())
            }
            LocationDeletion::NotFound => {
                Err(AppError::NotFound(format!("Location {}", location_id)))
            }
            LocationDeletion::InUse => Err(AppError::Conflict {
                resource: "location".to_string(),
                message: format!(
                    "Location {} has stock movements and cannot be deleted",
                    location_id
                ),
            }),
        }
    }

    // ========================================================================
    // Demo data
    // ========================================================================

    /// Seed sample data into an empty catalog. Returns false when data exists.
    pub async fn seed_demo_data(&self) -> AppResult<bool> {
        if !self.store.list_products().await?.is_empty()
            || !self.store.list_locations().await?.is_empty()
        {
            return Ok(false);
        }

        let locations = [
            ("Main Warehouse", "Primary storage facility"),
            ("Store A", "Retail outlet A"),
            ("Warehouse B", "Secondary warehouse"),
            ("Distribution Center", "Central distribution hub"),
        ];
        let mut location_ids = Vec::with_capacity(locations.len());
        for (name, description) in locations {
            let location = self
                .create_location(LocationInput {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                })
                .await?;
            location_ids.push(location.location_id);
        }

        let products = [
            ("Face Wash", "Gentle cleansing face wash", 50, 15),
            ("Serum", "Anti-aging serum", 30, 10),
            ("Sunscreen", "SPF 50+ sunscreen", 40, 12),
        ];
        let mut seeded = Vec::with_capacity(products.len());
        for (name, description, received, transferred) in products {
            let product = self
                .create_product(CreateProductInput {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    min_stock: Some(10),
                    initial_qty: None,
                })
                .await?;
            seeded.push((product.product_id, received, transferred));
        }

        // Receipts into the main warehouse, then transfers to the store
        let (main, store) = (&location_ids[0], &location_ids[1]);
        for (product_id, received, _) in &seeded {
            self.ledger
                .record_movement(RecordMovementInput {
                    product_id: product_id.clone(),
                    qty: *received,
                    from_location: None,
                    to_location: Some(main.clone()),
                })
                .await?;
        }
        for (product_id, _, transferred) in &seeded {
            self.ledger
                .record_movement(RecordMovementInput {
                    product_id: product_id.clone(),
                    qty: *transferred,
                    from_location: Some(main.clone()),
                    to_location: Some(store.clone()),
                })
                .await?;
        }

        tracing::info!("Demo data seeded");
        Ok(true)
    }
}

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name", "Name is required"));
    }
    Ok(name.to_string())
}
