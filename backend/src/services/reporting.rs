//! Reporting service: low-stock report, balance report, dashboard and exports
//!
//! Every report is computed from grouped flows of the movement log. No running
//! balance table is maintained.

use std::sync::Arc;

use serde::Serialize;
use shared::ledger;
use shared::models::{
    BalanceRow, Dashboard, LocationQty, LowStockItem, MovementView, ProductSummary, ProductTotal,
};

use crate::error::{AppError, AppResult};
use crate::store::LedgerStore;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn LedgerStore>,
}

impl ReportingService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Products whose total stock is at or below their minimum, in product order
    pub async fn low_stock_report(&self) -> AppResult<Vec<LowStockItem>> {
        let products = self.store.list_products().await?;
        let flows = self.store.product_flows().await?;
        Ok(ledger::low_stock(&products, &flows))
    }

    pub async fn low_stock_count(&self) -> AppResult<i64> {
        Ok(self.low_stock_report().await?.len() as i64)
    }

    /// Positive balances for every location × product pair
    pub async fn balance_report(&self) -> AppResult<Vec<BalanceRow>> {
        let locations = self.store.list_locations().await?;
        let products = self.store.list_products().await?;
        let flows = self.store.location_flows(None).await?;

        let rows = ledger::balance_report(&locations, &products, &flows);
        tracing::debug!(rows = rows.len(), "Balance report computed");
        Ok(rows)
    }

    /// Locations holding the product; unknown products have none
    pub async fn product_locations(&self, product_id: &str) -> AppResult<Vec<LocationQty>> {
        let locations = self.store.list_locations().await?;
        let flows = self.store.location_flows(Some(product_id)).await?;
        Ok(ledger::product_locations(product_id, &locations, &flows))
    }

    pub async fn product_list(&self) -> AppResult<Vec<ProductSummary>> {
        let products = self.store.list_products().await?;
        let flows = self.store.product_flows().await?;
        Ok(ledger::product_summaries(&products, &flows))
    }

    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        let products = self.store.list_products().await?;
        let locations = self.store.list_locations().await?;
        let flows = self.store.product_flows().await?;
        let total_movements = self.store.count_movements().await?;

        let total_stock = ledger::product_summaries(&products, &flows)
            .into_iter()
            .map(|p| ProductTotal {
                product: p.name,
                total: p.total_qty,
            })
            .collect();

        Ok(Dashboard {
            total_products: products.len() as i64,
            total_locations: locations.len() as i64,
            total_movements,
            low_stock: ledger::low_stock(&products, &flows),
            total_stock,
        })
    }

    /// Newest movements first
    pub async fn movement_history(&self) -> AppResult<Vec<MovementView>> {
        self.store.movement_history().await
    }

    /// Export report rows to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_balance_rows_to_csv() {
        let rows = vec![
            BalanceRow {
                product_name: "Face Wash".to_string(),
                location_name: "Main Warehouse".to_string(),
                qty: 35,
            },
            BalanceRow {
                product_name: "Serum, travel size".to_string(),
                location_name: "Store A".to_string(),
                qty: 10,
            },
        ];

        let csv = ReportingService::export_to_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("product_name,location_name,qty"));
        assert_eq!(lines.next(), Some("Face Wash,Main Warehouse,35"));
        assert_eq!(lines.next(), Some("\"Serum, travel size\",Store A,10"));
    }

    #[test]
    fn test_export_empty_report() {
        let rows: Vec<BalanceRow> = Vec::new();
        assert_eq!(ReportingService::export_to_csv(&rows).unwrap(), "");
    }
}
