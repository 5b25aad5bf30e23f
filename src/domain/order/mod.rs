// ============================================================================
// Order Domain - Lifecycle Rules and Views
// ============================================================================
//
// This module contains ALL order-specific code:
// - Status registry (closed OrderStatus enum + reference-table rows)
// - Eligibility rules and the transition applicator
// - Entities (Order, OrderDetail) and their creation inputs
// - Flat-row aggregation into grouped views
//
// Persistence and orchestration stay out; everything here is pure.
//
// ============================================================================

pub mod grouping;
pub mod model;
pub mod rules;
pub mod status;
pub mod views;

// Re-export for convenience
pub use grouping::*;
pub use model::*;
pub use rules::*;
pub use status::*;
pub use views::*;
