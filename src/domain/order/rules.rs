use chrono::{DateTime, Duration, Utc};

use super::model::OrderDetail;
use super::status::OrderStatus;

// ============================================================================
// Order Lifecycle Rules
// ============================================================================
//
// Two pieces, deliberately kept apart:
// 1. Eligibility check - pure predicate over (current status, target status,
//    detail age). No side effects, so it can be tested without persistence.
// 2. Transition applicator - mutates a detail into the new status and reports
//    whether the line's quantity goes back into stock.
//
// The applicator never runs the check itself. Callers decide: user paths
// check first, admin paths apply directly.
//
// ============================================================================

/// Days after a detail's creation during which a regular refund is accepted.
pub const REFUND_PERIOD_DAYS: i64 = 10;
/// Days after a detail's creation during which a breakage refund is accepted.
pub const BREAKAGE_REFUND_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("Order already shipped out")]
    AlreadyShippingOut,

    #[error("This order is already refunded")]
    AlreadyRefunded,

    #[error("Order has not been shipped")]
    NotShipped,

    #[error("The refund window for this order has expired")]
    ExpiredToRefund,

    #[error("The order is not paid")]
    NotPaid,
}

/// Decide whether a detail in `current` may move to `target`.
///
/// `created_at` is the detail's creation timestamp; refund windows are
/// measured against it, not against the last status change.
pub fn check_transition(
    current: OrderStatus,
    target: OrderStatus,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), RuleViolation> {
    match target {
        OrderStatus::ShippingOut => {
            if current == OrderStatus::ShippingOut {
                return Err(RuleViolation::AlreadyShippingOut);
            }
            Ok(())
        }
        OrderStatus::Refund => check_refund(current, created_at, now, REFUND_PERIOD_DAYS),
        OrderStatus::BreakageRefund => {
            check_refund(current, created_at, now, BREAKAGE_REFUND_PERIOD_DAYS)
        }
        OrderStatus::Canceled => {
            if current != OrderStatus::Paid {
                return Err(RuleViolation::NotPaid);
            }
            Ok(())
        }
        // No guard defined for the remaining targets.
        _ => Ok(()),
    }
}

fn check_refund(
    current: OrderStatus,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window_days: i64,
) -> Result<(), RuleViolation> {
    if current == OrderStatus::Refund || current == OrderStatus::BreakageRefund {
        return Err(RuleViolation::AlreadyRefunded);
    }
    if current != OrderStatus::Shipped {
        return Err(RuleViolation::NotShipped);
    }
    if created_at < now - Duration::days(window_days) {
        return Err(RuleViolation::ExpiredToRefund);
    }
    Ok(())
}

/// Stock consequence of an applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    None,
    /// Put this many units back on the detail's product.
    Restock(i32),
}

/// Move `detail` into `new_status`, stamping the update time.
///
/// Returns the stock adjustment the caller must persist alongside the status
/// change. Eligibility is NOT checked here.
pub fn apply_transition(
    detail: &mut OrderDetail,
    new_status: OrderStatus,
    now: DateTime<Utc>,
) -> StockAdjustment {
    detail.status = new_status;
    detail.updated_at = Some(now);

    if new_status.triggers_restock() {
        StockAdjustment::Restock(detail.quantity)
    } else {
        StockAdjustment::None
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
