pub mod order;
pub mod point;
pub mod product;

pub use order::OrderService;
pub use point::PointService;
pub use product::ProductService;

// ============================================================================
// Caller Identity
// ============================================================================

/// Who is asking. Resolved once at the service boundary; admins skip the
/// eligibility rules and ownership scoping that apply to a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Admin,
    User(String),
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin)
    }

    pub fn login_id(&self) -> Option<&str> {
        match self {
            Caller::Admin => None,
            Caller::User(login_id) => Some(login_id),
        }
    }
}
