//! Product catalog models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A product tracked by the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Total stock at or below this value flags the product as low
    pub min_stock: i64,
    /// Creation order; drives report ordering
    #[serde(skip)]
    pub seq: i64,
}

/// Product row handed to the store; the store allocates the identifier
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub min_stock: i64,
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub min_stock: Option<i64>,
    /// Opening stock received into the receiving location
    #[serde(default, alias = "qty")]
    #[validate(range(
        min = 0,
        max = 2147483647,
        message = "Initial quantity must be between 0 and 2147483647"
    ))]
    pub initial_qty: Option<i64>,
}

/// Input for editing a product; the threshold is fixed at creation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
    /// Target total stock; the difference is booked at the receiving location
    #[validate(range(
        min = 0,
        max = 2147483647,
        message = "Quantity must be between 0 and 2147483647"
    ))]
    pub qty: Option<i64>,
}
