use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Status Registry
// ============================================================================
//
// Closed set of order-detail lifecycle states. The persistence layer stores
// the SCREAMING_SNAKE wire names; everything in-process works on this enum,
// so a typo'd status name can only fail at the parse boundary.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Paid,
    ShippingOut,
    Shipped,
    Refund,
    BreakageRefund,
    Canceled,
    PartialCanceled,
    PartialRefund,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Paid,
        OrderStatus::ShippingOut,
        OrderStatus::Shipped,
        OrderStatus::Refund,
        OrderStatus::BreakageRefund,
        OrderStatus::Canceled,
        OrderStatus::PartialCanceled,
        OrderStatus::PartialRefund,
    ];

    /// Wire/DB name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Paid => "PAID",
            OrderStatus::ShippingOut => "SHIPPING_OUT",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Refund => "REFUND",
            OrderStatus::BreakageRefund => "BREAKAGE_REFUND",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::PartialCanceled => "PARTIAL_CANCELED",
            OrderStatus::PartialRefund => "PARTIAL_REFUND",
        }
    }

    /// Whether entering this status puts the detail's quantity back in stock.
    pub fn triggers_restock(&self) -> bool {
        matches!(
            self,
            OrderStatus::Canceled
                | OrderStatus::PartialCanceled
                | OrderStatus::Refund
                | OrderStatus::PartialRefund
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAID" => Ok(OrderStatus::Paid),
            "SHIPPING_OUT" => Ok(OrderStatus::ShippingOut),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "REFUND" => Ok(OrderStatus::Refund),
            "BREAKAGE_REFUND" => Ok(OrderStatus::BreakageRefund),
            "CANCELED" => Ok(OrderStatus::Canceled),
            "PARTIAL_CANCELED" => Ok(OrderStatus::PartialCanceled),
            "PARTIAL_REFUND" => Ok(OrderStatus::PartialRefund),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Row of the managed status reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: i32,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Unit Tests
// ============================================================================
