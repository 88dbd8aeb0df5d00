//! Common types used across the ledger

use serde::{Deserialize, Serialize};

/// Minimum-stock threshold applied when a product is created without one
pub const DEFAULT_MIN_STOCK: i64 = 5;

/// Largest quantity a single movement may carry (the range of a 32-bit column)
pub const MAX_MOVEMENT_QTY: i64 = i32::MAX as i64;

/// Entities that receive sequential, human-readable identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    Product,
    Location,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Product => "PROD",
            IdKind::Location => "WH",
        }
    }

    /// Format a sequence number as an identifier (`PROD001`, `WH012`).
    ///
    /// Sequences past 999 widen instead of wrapping.
    pub fn format(&self, seq: i64) -> String {
        format!("{}{:03}", self.prefix(), seq)
    }
}

impl std::fmt::Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdKind::Product => write!(f, "Product"),
            IdKind::Location => write!(f, "Location"),
        }
    }
}
