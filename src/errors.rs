use thiserror::Error;

use crate::domain::catalog::CatalogError;
use crate::domain::order::RuleViolation;
use crate::repository::StoreError;

// ============================================================================
// Service Errors
// ============================================================================

/// Top-level error for service operations. Rule violations and catalog
/// guards carry the caller-facing reason; storage failures wrap the
/// repository error unchanged.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transition rejected: {0}")]
    Rule(#[from] RuleViolation),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
