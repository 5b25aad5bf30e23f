use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::OrderStatus;

// ============================================================================
// Order Entities
// ============================================================================
//
// One Order is one checkout submission; its line items are OrderDetail rows
// referencing Product and Wrapping by id. The header is immutable after
// creation, details are re-stated (never deleted) as the lifecycle advances.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Groups the detail lines of one checkout submission.
    pub token: Uuid,
    pub address: String,
    pub address_detail: String,
    pub zipcode: String,
    pub receiver: String,
    pub sender: String,
    pub request: Option<String>,
    pub delivery_rate: i32,
    /// Total price of the submission as charged.
    pub price: i32,
    /// None for guest checkout.
    pub login_id: Option<String>,
    /// Contact mail; the read key for guest-checkout lookups.
    pub order_email: Option<String>,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i32,
    pub wrapping_id: i32,
    pub status: OrderStatus,
    /// Unit price snapshotted at creation; later product price changes do
    /// not propagate here.
    pub price: i32,
    pub quantity: i32,
    pub wrap: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Header fields of an order about to be created. The id is assigned by the
/// store, the token by the caller.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub token: Uuid,
    pub address: String,
    pub address_detail: String,
    pub zipcode: String,
    pub receiver: String,
    pub sender: String,
    pub request: Option<String>,
    pub delivery_rate: i32,
    pub price: i32,
    pub login_id: Option<String>,
    pub order_email: Option<String>,
    pub coupon_code: Option<String>,
}

/// One line of an order about to be created. The unit price is snapshotted
/// from the product at insert time, inside the same transaction that
/// decrements its stock.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: i32,
    pub quantity: i32,
    /// None means the UNPACKAGED sentinel wrapping.
    pub wrapping_id: Option<i32>,
    pub wrap: bool,
    pub status: OrderStatus,
}

/// Status write-back for one detail, produced by the transition applicator.
///
/// Carries the status the caller observed when it decided the transition;
/// the store only applies the write while that status still holds, so two
/// transitions computed from the same snapshot cannot both commit.
#[derive(Debug, Clone)]
pub struct DetailStatusUpdate {
    pub detail_id: i64,
    pub prior_status: OrderStatus,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}
