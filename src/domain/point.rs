use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Point Domain - Policies and Accrual
// ============================================================================
//
// Points are an append-only ledger per user: every accrual or spend writes a
// PointLog carrying both the delta and the resulting balance, chained from
// the user's latest log.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointPolicy {
    pub id: i32,
    pub name: String,
    pub point: i32,
    pub rate: f64,
    /// Soft-delete flag; deleted policies stay on record but stop applying.
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointLog {
    pub id: i64,
    pub user_id: i64,
    pub inquiry: String,
    pub delta: i32,
    pub balance: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPointLog {
    pub user_id: i64,
    pub inquiry: String,
    pub delta: i32,
    pub balance: i32,
}

/// Points earned for an order: the policy rate and the user's grade benefit
/// each apply to the charged price, truncated separately.
pub fn earned_points(price: i32, policy_rate: f64, grade_benefit: f64) -> i32 {
    (price as f64 * policy_rate) as i32 + (price as f64 * grade_benefit) as i32
}

/// Balance after applying `delta` to the latest known balance (0 when the
/// user has no logs yet).
pub fn next_balance(previous: Option<i32>, delta: i32) -> i32 {
    previous.unwrap_or(0) + delta
}

// ============================================================================
// Unit Tests
// ============================================================================
