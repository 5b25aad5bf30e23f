use uuid::Uuid;

use super::views::{OrderRow, OrderView, Page};

// ============================================================================
// Order Aggregator
// ============================================================================
//
// The store returns a denormalized join projection: one row per detail, each
// carrying a copy of its order header. This module folds those rows back
// into one view per order token.
//
// Invariants:
// - group order is first-seen order of distinct tokens
// - details keep the original row order within their group
// - pagination windows the grouped views, so `total` counts orders
//
// ============================================================================

/// Partition flat join rows by order token, preserving first-seen token order.
pub fn group_by_order_token(rows: Vec<OrderRow>) -> Vec<OrderView> {
    let mut views: Vec<OrderView> = Vec::new();
    let mut positions: Vec<Uuid> = Vec::new();

    for row in rows {
        match positions.iter().position(|t| *t == row.order.token) {
            Some(idx) => views[idx].details.push(row.detail),
            None => {
                positions.push(row.order.token);
                views.push(OrderView::from_order(row.order, vec![row.detail]));
            }
        }
    }

    views
}

/// Window `views` to the requested page. Pages are 1-based; an out-of-range
/// page yields an empty item list but still reports the true total.
pub fn paginate(views: Vec<OrderView>, page: u32, size: u32) -> Page<OrderView> {
    let total = views.len() as u64;
    let page = page.max(1) as usize;
    let size = size as usize;

    let from = (page - 1).saturating_mul(size).min(views.len());
    let to = (from + size).min(views.len());

    Page {
        items: views[from..to].to_vec(),
        total,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
