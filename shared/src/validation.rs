//! Validation utilities for the Stock Ledger

use crate::models::MovementKind;
use crate::types::MAX_MOVEMENT_QTY;

// ============================================================================
// Ledger Validations
// ============================================================================

/// Validate that a movement quantity is positive and fits a single entry
pub fn validate_quantity(qty: i64) -> Result<(), &'static str> {
    if qty <= 0 {
        return Err("Quantity must be positive");
    }
    if qty > MAX_MOVEMENT_QTY {
        return Err("Quantity must be at most 2147483647");
    }
    Ok(())
}

/// Validate movement endpoints and return the resulting movement kind
pub fn validate_endpoints(from: Option<&str>, to: Option<&str>) -> Result<MovementKind, &'static str> {
    if let (Some(from), Some(to)) = (from, to) {
        if from == to {
            return Err("Source and destination locations must differ");
        }
    }
    MovementKind::classify(from, to).ok_or("Please specify at least one location (From or To)")
}

/// Treat blank optional form values as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate username format (3-50 characters, no whitespace)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 || username.len() > 50 {
        return Err("Username must be 3-50 characters");
    }
    if username.chars().any(char::is_whitespace) {
        return Err("Username cannot contain whitespace");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}
