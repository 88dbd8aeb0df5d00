//! Ledger movement models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movement {
    pub movement_id: i64,
    pub product_id: String,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub qty: i64,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    pub fn kind(&self) -> Option<MovementKind> {
        MovementKind::classify(self.from_location.as_deref(), self.to_location.as_deref())
    }
}

/// Shape of a movement, derived from which endpoints are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Destination only: stock receipt
    Inflow,
    /// Source only: consumption or sale
    Outflow,
    /// Both endpoints: relocation, net zero on total stock
    Transfer,
}

impl MovementKind {
    pub fn classify(from: Option<&str>, to: Option<&str>) -> Option<Self> {
        match (from, to) {
            (None, Some(_)) => Some(MovementKind::Inflow),
            (Some(_), None) => Some(MovementKind::Outflow),
            (Some(_), Some(_)) => Some(MovementKind::Transfer),
            (None, None) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inflow => "inflow",
            MovementKind::Outflow => "outflow",
            MovementKind::Transfer => "transfer",
        }
    }
}

/// Movement row handed to the store; id and timestamp are assigned on write
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: String,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub qty: i64,
}

/// Input for recording a movement
///
/// Empty location strings are treated as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMovementInput {
    pub product_id: String,
    pub qty: i64,
    #[serde(default)]
    pub from_location: Option<String>,
    #[serde(default)]
    pub to_location: Option<String>,
}

/// Movement history entry joined with product and location names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovementView {
    pub movement_id: i64,
    pub product_id: String,
    pub product_name: String,
    pub from_location: Option<String>,
    pub from_location_name: Option<String>,
    pub to_location: Option<String>,
    pub to_location_name: Option<String>,
    pub qty: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MovementKind>,
    pub created_at: DateTime<Utc>,
}
