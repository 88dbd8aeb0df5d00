//! Storage location models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A named place where stock is held
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub location_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip)]
    pub seq: i64,
}

/// Input for creating or editing a location
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

/// Name/description change applied to a product or location
#[derive(Debug, Clone)]
pub struct EntityUpdate {
    pub name: String,
    pub description: Option<String>,
}

/// Outcome of a location delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationDeletion {
    Deleted,
    NotFound,
    /// Movements still reference the location
    InUse,
}
