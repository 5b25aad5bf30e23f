use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::{Product, Wrapping};

use super::model::Order;
use super::status::OrderStatus;

// ============================================================================
// Order Views
// ============================================================================

/// One line item, resolved against its product and wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetailView {
    pub id: i64,
    pub price: i32,
    pub quantity: i32,
    pub wrap: bool,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub wrapping: Wrapping,
    pub product: Product,
}

/// One checkout submission with all of its detail lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: i64,
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
    pub details: Vec<OrderDetailView>,
}

impl OrderView {
    pub fn from_order(order: Order, details: Vec<OrderDetailView>) -> Self {
        Self {
            id: order.id,
            token: order.token,
            address: order.address,
            address_detail: order.address_detail,
            zipcode: order.zipcode,
            receiver: order.receiver,
            sender: order.sender,
            request: order.request,
            delivery_rate: order.delivery_rate,
            price: order.price,
            login_id: order.login_id,
            order_email: order.order_email,
            coupon_code: order.coupon_code,
            details,
        }
    }
}

/// Flat projection row as the store returns it: one detail joined with its
/// order header. The aggregator regroups these into nested views.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub order: Order,
    pub detail: OrderDetailView,
}

/// One page of a listing. For grouped order listings `total` counts
/// distinct orders, not the flat rows they were assembled from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
