//! Ledger engine: recording movements and answering balance queries
//!
//! Every stock level is derived from the movement log on demand:
//!
//! - total stock: `Σ qty into any location − Σ qty out of a location to nowhere`
//! - location balance: `Σ qty into L − Σ qty out of L`
//!
//! Recording a movement validates it, appends it through the store (which checks
//! source availability atomically with the insert), then evaluates the
//! low-stock rule for the product. Alerts are delivered on a background task
//! so a slow relay never holds up the response.

use std::sync::Arc;

use shared::ledger::{is_low_stock, BalanceQuery};
use shared::models::{Movement, NewMovement, RecordMovementInput};
use shared::validation::{non_blank, validate_endpoints, validate_quantity};
use tracing::{instrument, Instrument};

use crate::error::{AppError, AppResult};
use crate::services::notification::Notifier;
use crate::store::{LedgerStore, StockGuard};

/// Ledger service owning movement recording and balance queries
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Record a movement after validating it against the ledger rules
    #[instrument(
        skip(self, input),
        fields(product_id = %input.product_id, qty = input.qty),
        err
    )]
    pub async fn record_movement(&self, input: RecordMovementInput) -> AppResult<Movement> {
        validate_quantity(input.qty).map_err(|_| AppError::InvalidQuantity(input.qty))?;

        let from_location = non_blank(input.from_location);
        let to_location = non_blank(input.to_location);
        let kind = validate_endpoints(from_location.as_deref(), to_location.as_deref())
            .map_err(|msg| AppError::validation("location", msg))?;

        let product = self
            .store
            .find_product(&input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", input.product_id)))?;

        for location_id in [&from_location, &to_location].into_iter().flatten() {
            if self.store.find_location(location_id).await?.is_none() {
                return Err(AppError::NotFound(format!("Location {}", location_id)));
            }
        }

        let guard = from_location.as_ref().map(|location_id| StockGuard {
            location_id: location_id.clone(),
            requested: input.qty,
        });

        let movement = self
            .store
            .append_movement(
                NewMovement {
                    product_id: product.product_id.clone(),
                    from_location,
                    to_location,
                    qty: input.qty,
                },
                guard,
            )
            .await?;

        tracing::info!(
            movement_id = movement.movement_id,
            kind = kind.as_str(),
            "Movement recorded"
        );

        self.check_low_stock(&product.product_id, &product.name, product.min_stock)
            .await;

        Ok(movement)
    }

    /// Notify when the product is at or below its threshold.
    ///
    /// Runs after the movement is committed. Delivery is spawned; failures are
    /// logged and swallowed.
    async fn check_low_stock(&self, product_id: &str, product_name: &str, min_stock: i64) {
        let total = match self.total_stock(product_id).await {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(product_id, "Low-stock check skipped: {}", e);
                return;
            }
        };

        if !is_low_stock(total, min_stock) {
            return;
        }

        let notifier = self.notifier.clone();
        let product_id = product_id.to_string();
        let product_name = product_name.to_string();
        tokio::spawn(
            async move {
                if let Err(e) = notifier
                    .notify_low_stock(&product_name, total, min_stock)
                    .await
                {
                    tracing::warn!(product_id = %product_id, "Low-stock notification failed: {}", e);
                }
            }
            .instrument(tracing::Span::current()),
        );
    }

    /// Product-level stock; transfers between locations do not change it
    pub async fn total_stock(&self, product_id: &str) -> AppResult<i64> {
        self.evaluate(&BalanceQuery::total(product_id)).await
    }

    /// Stock of a product at one location, transfers counted on both sides
    pub async fn location_balance(&self, product_id: &str, location_id: &str) -> AppResult<i64> {
        self.evaluate(&BalanceQuery::at_location(product_id, location_id))
            .await
    }

    async fn evaluate(&self, query: &BalanceQuery) -> AppResult<i64> {
        let incoming = self.store.sum_quantity(&query.incoming()).await?;
        let outgoing = self.store.sum_quantity(&query.outgoing()).await?;
        incoming
            .checked_sub(outgoing)
            .ok_or_else(|| AppError::Internal(format!("Balance out of range for {:?}", query)))
    }

    /// Remove a product and every movement that references it
    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, product_id: &str) -> AppResult<()> {
        let removed = self
            .store
            .delete_product_cascade(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))?;

        tracing::info!(product_id, movements_removed = removed, "Product deleted");
        Ok(())
    }

    /// Remove a single ledger entry (administrative correction)
    #[instrument(skip(self), err)]
    pub async fn delete_movement(&self, movement_id: i64) -> AppResult<()> {
        if !self.store.delete_movement(movement_id).await? {
            return Err(AppError::NotFound(format!("Movement {}", movement_id)));
        }
        tracing::info!(movement_id, "Movement deleted");
        Ok(())
    }

    pub async fn movement_count(&self) -> AppResult<i64> {
        self.store.count_movements().await
    }
}
