//! Domain models for the Stock Ledger

mod location;
mod movement;
mod product;
mod report;
mod user;

pub use location::*;
pub use movement::*;
pub use product::*;
pub use report::*;
pub use user::*;
