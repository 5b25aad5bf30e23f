use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::order::{OrderStatus, OrderView, Page};
use crate::errors::ServiceError;
use crate::repository::Store;
use crate::service::order::CreateOrderRequest;
use crate::service::{Caller, OrderService};

// ============================================================================
// Cached Order Reader
// ============================================================================
//
// Decorates the order service with a read cache over the paginated "all
// orders" listing, keyed by (page, size). Mutations go straight through to
// the inner service and flush the whole cache, so a hit can never serve a
// listing older than the last write.
//
// ============================================================================

pub struct CachedOrderReader<S: Store> {
    inner: OrderService<S>,
    pages: RwLock<HashMap<(u32, u32), Page<OrderView>>>,
}

impl<S: Store> CachedOrderReader<S> {
    pub fn new(inner: OrderService<S>) -> Self {
        Self {
            inner,
            pages: RwLock::new(HashMap::new()),
        }
    }

    pub async fn read_orders(&self, page: u32, size: u32) -> Result<Page<OrderView>, ServiceError> {
        if let Some(hit) = self.pages.read().await.get(&(page, size)) {
            debug!(page, size, "order listing cache hit");
            return Ok(hit.clone());
        }

        let listing = self.inner.read_orders(page, size).await?;
        self.pages
            .write()
            .await
            .insert((page, size), listing.clone());
        Ok(listing)
    }

    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderView, ServiceError> {
        let view = self.inner.create_order(request).await?;
        self.invalidate().await;
        Ok(view)
    }

    pub async fn update_order_status(
        &self,
        caller: &Caller,
        token: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderView, ServiceError> {
        let view = self.inner.update_order_status(caller, token, new_status).await?;
        self.invalidate().await;
        Ok(view)
    }

    pub async fn update_order_detail(
        &self,
        caller: &Caller,
        detail_id: i64,
        new_status: OrderStatus,
    ) -> Result<OrderView, ServiceError> {
        let view = self.inner.update_order_detail(caller, detail_id, new_status).await?;
        self.invalidate().await;
        Ok(view)
    }

    pub async fn invalidate(&self) {
        self.pages.write().await.clear();
    }

    // Per-order reads are not cached and pass straight through. Delegated
    // here rather than exposing the inner service, so no caller can mutate
    // around the invalidation.

    pub async fn read_order(&self, caller: &Caller, token: Uuid) -> Result<OrderView, ServiceError> {
        self.inner.read_order(caller, token).await
    }

    pub async fn read_order_without_login(
        &self,
        token: Uuid,
        order_email: &str,
    ) -> Result<OrderView, ServiceError> {
        self.inner.read_order_without_login(token, order_email).await
    }

    pub async fn read_my_orders(
        &self,
        login_id: &str,
        page: u32,
        size: u32,
    ) -> Result<Page<OrderView>, ServiceError> {
        self.inner.read_my_orders(login_id, page, size).await
    }
}

// ============================================================================
// Tests
// ============================================================================
