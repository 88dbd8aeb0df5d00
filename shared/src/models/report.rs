//! Report and dashboard view models
//!
//! The `LowStockCount` and `ProductLocations` shapes are consumed by the
//! front end as-is and must not change.

use serde::{Deserialize, Serialize};

/// A product at or below its minimum-stock threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LowStockItem {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: i64,
    pub min_stock: i64,
}

/// One line of the balance report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceRow {
    pub product_name: String,
    pub location_name: String,
    pub qty: i64,
}

/// `{"count": n}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LowStockCount {
    pub count: i64,
}

/// Positive stock of one product at one location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationQty {
    pub location: String,
    pub qty: i64,
}

/// `{"locations": [{"location": name, "qty": n}, ...]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductLocations {
    pub locations: Vec<LocationQty>,
}

/// Product list entry with computed total stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSummary {
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    pub min_stock: i64,
    pub total_qty: i64,
}

/// Total stock of one product, for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductTotal {
    pub product: String,
    pub total: i64,
}

/// Dashboard aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_products: i64,
    pub total_locations: i64,
    pub total_movements: i64,
    pub low_stock: Vec<LowStockItem>,
    pub total_stock: Vec<ProductTotal>,
}
