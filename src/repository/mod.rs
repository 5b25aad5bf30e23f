use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::catalog::{DeliveryPolicy, NewProduct, Product, Wrapping};
use crate::domain::order::{
    DetailStatusUpdate, NewOrder, NewOrderLine, Order, OrderDetail, OrderRow, OrderStatus,
    StatusRecord, UnknownStatus,
};
use crate::domain::point::{NewPointLog, PointLog, PointPolicy};
use crate::domain::user::{Grade, UnknownGrade, UserAccount};

pub mod postgres;

#[cfg(test)]
pub mod memory;

// ============================================================================
// Persistence Seam
// ============================================================================
//
// Entity-scoped repository traits mirroring the lookups the services need.
// Multi-step mutations (`insert_order`, `commit_transition`) are single trait
// calls so an implementation can run them as one atomic unit of work; nothing
// is retried, a conflicting concurrent write surfaces as `StoreError`.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Order not found")]
    OrderNotFound,

    #[error("Order detail not found")]
    OrderDetailNotFound,

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Wrapping not found: {0}")]
    WrappingNotFound(i32),

    #[error("Order status not found")]
    StatusNotFound,

    #[error("Delivery policy not found: {0}")]
    DeliveryPolicyNotFound(i32),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Point policy not found: {0}")]
    PointPolicyNotFound(String),

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: i32 },

    #[error("Order detail changed concurrently")]
    DetailConflict,

    #[error(transparent)]
    BadStatus(#[from] UnknownStatus),

    #[error(transparent)]
    BadGrade(#[from] UnknownGrade),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Which orders a flat-projection listing covers.
#[derive(Debug, Clone)]
pub enum OrderListScope {
    All,
    Login(String),
}

#[async_trait]
pub trait OrderRepo: Send + Sync {
    /// Allocate an order and its detail lines in one atomic unit of work,
    /// snapshotting each line's unit price and decrementing product stock.
    /// Fails whole (no partial decrement) on any lookup failure or
    /// insufficient stock.
    async fn insert_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<(Order, Vec<OrderDetail>), StoreError>;

    async fn order_by_token(&self, token: Uuid) -> Result<Order, StoreError>;

    async fn details_for_order(&self, order_id: i64) -> Result<Vec<OrderDetail>, StoreError>;

    async fn details_for_order_and_login(
        &self,
        order_id: i64,
        login_id: &str,
    ) -> Result<Vec<OrderDetail>, StoreError>;

    async fn details_for_order_and_email(
        &self,
        order_id: i64,
        order_email: &str,
    ) -> Result<Vec<OrderDetail>, StoreError>;

    async fn detail_by_id(&self, detail_id: i64) -> Result<OrderDetail, StoreError>;

    async fn detail_by_id_and_login(
        &self,
        detail_id: i64,
        login_id: &str,
    ) -> Result<OrderDetail, StoreError>;

    async fn token_for_detail(&self, detail_id: i64) -> Result<Uuid, StoreError>;

    /// Persist applied transitions plus their stock consequences in one
    /// atomic unit of work. `restocks` pairs are (product id, quantity).
    async fn commit_transition(
        &self,
        updates: &[DetailStatusUpdate],
        restocks: &[(i32, i32)],
    ) -> Result<(), StoreError>;

    /// Denormalized join of orders x details x products x wrappings, ordered
    /// by detail creation time then detail id.
    async fn flat_rows(&self, scope: OrderListScope) -> Result<Vec<OrderRow>, StoreError>;
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn product_by_id(&self, id: i32) -> Result<Product, StoreError>;
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError>;
    async fn update_product(&self, product: &Product) -> Result<Product, StoreError>;
    async fn products(&self, offset: i64, limit: i64) -> Result<(Vec<Product>, u64), StoreError>;

    async fn wrapping_by_id(&self, id: i32) -> Result<Wrapping, StoreError>;
    async fn insert_wrapping(&self, paper: &str, price: i32) -> Result<Wrapping, StoreError>;
    async fn update_wrapping(&self, wrapping: &Wrapping) -> Result<Wrapping, StoreError>;
    async fn delete_wrapping(&self, id: i32) -> Result<(), StoreError>;
    async fn wrappings(&self) -> Result<Vec<Wrapping>, StoreError>;

    async fn delivery_policy_by_id(&self, id: i32) -> Result<DeliveryPolicy, StoreError>;
    async fn insert_delivery_policy(
        &self,
        name: &str,
        policy_price: i32,
        standard_price: i32,
    ) -> Result<DeliveryPolicy, StoreError>;
    async fn update_delivery_policy(
        &self,
        policy: &DeliveryPolicy,
    ) -> Result<DeliveryPolicy, StoreError>;
    async fn delete_delivery_policy(&self, id: i32) -> Result<(), StoreError>;
    async fn delivery_policies(&self) -> Result<Vec<DeliveryPolicy>, StoreError>;
}

#[async_trait]
pub trait StatusRepo: Send + Sync {
    async fn insert_status(&self, status: OrderStatus) -> Result<StatusRecord, StoreError>;
    async fn update_status(&self, id: i32, status: OrderStatus) -> Result<StatusRecord, StoreError>;
    async fn delete_status(&self, id: i32) -> Result<(), StoreError>;
    async fn status_by_id(&self, id: i32) -> Result<StatusRecord, StoreError>;
    async fn status_by_name(&self, status: OrderStatus) -> Result<StatusRecord, StoreError>;
    async fn statuses(&self) -> Result<Vec<StatusRecord>, StoreError>;
}

#[async_trait]
pub trait PointRepo: Send + Sync {
    async fn insert_point_policy(
        &self,
        name: &str,
        point: i32,
        rate: f64,
    ) -> Result<PointPolicy, StoreError>;
    async fn update_point_policy(&self, id: i32, point: i32, rate: f64)
        -> Result<(), StoreError>;
    /// Soft delete; the policy stays on record with its flag set.
    async fn delete_point_policy(&self, id: i32) -> Result<(), StoreError>;
    async fn point_policies(&self) -> Result<Vec<PointPolicy>, StoreError>;
    /// Only resolves live (non-deleted) policies.
    async fn point_policy_by_name(&self, name: &str) -> Result<PointPolicy, StoreError>;

    async fn latest_point_log(&self, user_id: i64) -> Result<Option<PointLog>, StoreError>;
    async fn insert_point_log(&self, log: NewPointLog) -> Result<PointLog, StoreError>;
    async fn point_logs(&self, offset: i64, limit: i64) -> Result<Vec<PointLog>, StoreError>;
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn user_by_login(&self, login_id: &str) -> Result<UserAccount, StoreError>;
    async fn upsert_user(
        &self,
        login_id: &str,
        email: &str,
        grade: Grade,
    ) -> Result<UserAccount, StoreError>;
}

/// Everything the services need, in one bound.
pub trait Store:
    OrderRepo + CatalogRepo + StatusRepo + PointRepo + UserRepo + Send + Sync + 'static
{
}

impl<T> Store for T where
    T: OrderRepo + CatalogRepo + StatusRepo + PointRepo + UserRepo + Send + Sync + 'static
{
}
