use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog Domain - Products, Wrappings, Delivery Policies
// ============================================================================

/// Wrapping id used when a line was ordered without gift wrap.
pub const UNPACKAGED_WRAPPING_ID: i32 = 1;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),
}

/// A sellable product owning a mutable stock counter.
///
/// The counter never goes negative: `decrease_stock` fails instead of
/// wrapping, and leaves the value untouched on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: i32,
    pub stock: i32,
}

impl Product {
    pub fn decrease_stock(&mut self, quantity: i32) -> Result<(), CatalogError> {
        if quantity <= 0 {
            return Err(CatalogError::InvalidQuantity(quantity));
        }
        if quantity > self.stock {
            return Err(CatalogError::InsufficientStock {
                requested: quantity,
                available: self.stock,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    /// Unconditional: cancellations and refunds always restock.
    pub fn increase_stock(&mut self, quantity: i32) {
        self.stock += quantity;
    }
}

/// Product fields for creation; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: i32,
    pub stock: i32,
}

/// Gift-wrap option. Id 1 is the UNPACKAGED sentinel seeded at bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Wrapping {
    pub id: i32,
    pub paper: String,
    pub price: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryPolicy {
    pub id: i32,
    pub name: String,
    pub policy_price: i32,
    pub standard_price: i32,
}

// ============================================================================
// Unit Tests
// ============================================================================
