//! HTTP handlers

pub mod auth;
pub mod health;
pub mod locations;
pub mod movements;
pub mod products;
pub mod reporting;

pub use auth::*;
pub use health::*;
pub use locations::*;
pub use movements::*;
pub use products::*;
pub use reporting::*;
