//! Shared types and models for the Stock Ledger
//!
//! This crate contains the domain types, identifier rules, input validation
//! and the pure balance arithmetic used by the backend and its tests.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
