// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// This layer holds the business rules as pure types and functions:
// - order: lifecycle statuses, eligibility rules, flat-row aggregation
// - catalog: products with the stock guard, wrappings, delivery policies
// - point: policies, accrual math, the chained point ledger
// - user: the identity snapshot the order/point paths need
//
// This layer is completely separate from persistence and orchestration.
//
// ============================================================================

pub mod catalog;
pub mod order;
pub mod point;
pub mod user;
