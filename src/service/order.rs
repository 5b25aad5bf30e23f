use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::catalog::{DeliveryPolicy, Wrapping};
use crate::domain::order::grouping::{group_by_order_token, paginate};
use crate::domain::order::rules::{apply_transition, check_transition, StockAdjustment};
use crate::domain::order::{
    DetailStatusUpdate, NewOrder, NewOrderLine, Order, OrderDetail, OrderDetailView, OrderStatus,
    OrderView, Page, StatusRecord,
};
use crate::errors::ServiceError;
use crate::repository::{OrderListScope, Store, StoreError};
use crate::service::Caller;

// ============================================================================
// Order Service
// ============================================================================
//
// Drives the order lifecycle end to end: placement (with stock reservation
// and price snapshotting), status transitions guarded by the refund and
// cancellation rules, and the grouped order listings. Pure decisions live in
// domain::order; this layer sequences them against the store.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateOrderLine {
    pub product_id: i32,
    pub quantity: i32,
    pub wrapping_id: Option<i32>,
    pub wrap: bool,
}

#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub address: String,
    pub address_detail: String,
    pub zipcode: String,
    pub receiver: String,
    pub sender: String,
    pub request: Option<String>,
    pub delivery_rate: i32,
    pub price: i32,
    pub login_id: Option<String>,
    pub order_email: Option<String>,
    pub coupon_code: Option<String>,
    pub lines: Vec<CreateOrderLine>,
}

pub struct OrderService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    /// Places an order: every line reserves stock and snapshots the unit
    /// price as of now, all within one store transaction. Lines start in
    /// `Paid`.
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderView, ServiceError> {
        if let Some(login_id) = &request.login_id {
            // Reject unknown accounts before reserving any stock.
            self.store.user_by_login(login_id).await?;
        }

        let token = Uuid::new_v4();
        let new_order = NewOrder {
            token,
            address: request.address,
            address_detail: request.address_detail,
            zipcode: request.zipcode,
            receiver: request.receiver,
            sender: request.sender,
            request: request.request,
            delivery_rate: request.delivery_rate,
            price: request.price,
            login_id: request.login_id,
            order_email: request.order_email,
            coupon_code: request.coupon_code,
        };
        let lines = request
            .lines
            .into_iter()
            .map(|line| NewOrderLine {
                product_id: line.product_id,
                quantity: line.quantity,
                wrapping_id: line.wrapping_id,
                wrap: line.wrap,
                status: OrderStatus::Paid,
            })
            .collect();

        let (order, details) = self.store.insert_order(new_order, lines).await?;
        info!(order_id = order.id, token = %order.token, "order placed");
        self.assemble_view(order, details).await
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Moves every line of an order to `new_status`. A user caller only sees
    /// their own orders and every line must pass the transition rules; an
    /// admin caller bypasses the rules but not the stock bookkeeping.
    #[instrument(skip(self), fields(token = %token, status = %new_status))]
    pub async fn update_order_status(
        &self,
        caller: &Caller,
        token: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderView, ServiceError> {
        let order = self.store.order_by_token(token).await?;
        let details = match caller.login_id() {
            Some(login_id) => {
                let details = self
                    .store
                    .details_for_order_and_login(order.id, login_id)
                    .await?;
                if details.is_empty() {
                    return Err(StoreError::OrderNotFound.into());
                }
                details
            }
            None => self.store.details_for_order(order.id).await?,
        };

        let updated = self.transition_details(caller, details, new_status).await?;
        info!(order_id = order.id, "order status updated");
        self.assemble_view(order, updated).await
    }

    /// Moves a single order line to `new_status` and returns the full order
    /// it belongs to. Same privilege rules as `update_order_status`.
    #[instrument(skip(self), fields(status = %new_status))]
    pub async fn update_order_detail(
        &self,
        caller: &Caller,
        detail_id: i64,
        new_status: OrderStatus,
    ) -> Result<OrderView, ServiceError> {
        let detail = match caller.login_id() {
            Some(login_id) => self.store.detail_by_id_and_login(detail_id, login_id).await?,
            None => self.store.detail_by_id(detail_id).await?,
        };
        let order_id = detail.order_id;

        self.transition_details(caller, vec![detail], new_status)
            .await?;

        let token = self.store.token_for_detail(detail_id).await?;
        let order = self.store.order_by_token(token).await?;
        let details = self.store.details_for_order(order_id).await?;
        self.assemble_view(order, details).await
    }

    async fn transition_details(
        &self,
        caller: &Caller,
        mut details: Vec<OrderDetail>,
        new_status: OrderStatus,
    ) -> Result<Vec<OrderDetail>, ServiceError> {
        let now = Utc::now();

        if !caller.is_admin() {
            for detail in &details {
                check_transition(detail.status, new_status, detail.created_at, now)?;
            }
        }

        let mut updates = Vec::with_capacity(details.len());
        let mut restocks = Vec::new();
        for detail in &mut details {
            let prior_status = detail.status;
            let adjustment = apply_transition(detail, new_status, now);
            updates.push(DetailStatusUpdate {
                detail_id: detail.id,
                prior_status,
                status: detail.status,
                updated_at: now,
            });
            if let StockAdjustment::Restock(quantity) = adjustment {
                restocks.push((detail.product_id, quantity));
            }
        }

        self.store.commit_transition(&updates, &restocks).await?;
        Ok(details)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// User callers only see orders placed under their own login; admin
    /// callers see any order.
    pub async fn read_order(&self, caller: &Caller, token: Uuid) -> Result<OrderView, ServiceError> {
        let order = self.store.order_by_token(token).await?;
        let details = match caller.login_id() {
            Some(login_id) => {
                let details = self
                    .store
                    .details_for_order_and_login(order.id, login_id)
                    .await?;
                if details.is_empty() {
                    return Err(StoreError::OrderNotFound.into());
                }
                details
            }
            None => self.store.details_for_order(order.id).await?,
        };
        self.assemble_view(order, details).await
    }

    /// Guest lookup: the order is only visible with the email it was placed
    /// under.
    pub async fn read_order_without_login(
        &self,
        token: Uuid,
        order_email: &str,
    ) -> Result<OrderView, ServiceError> {
        let order = self.store.order_by_token(token).await?;
        let details = self
            .store
            .details_for_order_and_email(order.id, order_email)
            .await?;
        if details.is_empty() {
            return Err(StoreError::OrderNotFound.into());
        }
        self.assemble_view(order, details).await
    }

    /// All orders, grouped per order and paginated over the groups. `total`
    /// counts orders, not lines.
    pub async fn read_orders(&self, page: u32, size: u32) -> Result<Page<OrderView>, ServiceError> {
        let rows = self.store.flat_rows(OrderListScope::All).await?;
        Ok(paginate(group_by_order_token(rows), page, size))
    }

    /// The caller's own orders, grouped and paginated the same way.
    pub async fn read_my_orders(
        &self,
        login_id: &str,
        page: u32,
        size: u32,
    ) -> Result<Page<OrderView>, ServiceError> {
        let rows = self
            .store
            .flat_rows(OrderListScope::Login(login_id.to_string()))
            .await?;
        Ok(paginate(group_by_order_token(rows), page, size))
    }

    pub async fn order_token_for_detail(&self, detail_id: i64) -> Result<Uuid, ServiceError> {
        Ok(self.store.token_for_detail(detail_id).await?)
    }

    // ------------------------------------------------------------------
    // Reference data
    // ------------------------------------------------------------------

    pub async fn create_status(&self, status: OrderStatus) -> Result<StatusRecord, ServiceError> {
        Ok(self.store.insert_status(status).await?)
    }

    pub async fn update_status(
        &self,
        id: i32,
        status: OrderStatus,
    ) -> Result<StatusRecord, ServiceError> {
        Ok(self.store.update_status(id, status).await?)
    }

    pub async fn delete_status(&self, id: i32) -> Result<(), ServiceError> {
        Ok(self.store.delete_status(id).await?)
    }

    pub async fn get_status(&self, id: i32) -> Result<StatusRecord, ServiceError> {
        Ok(self.store.status_by_id(id).await?)
    }

    pub async fn get_status_by_name(
        &self,
        status: OrderStatus,
    ) -> Result<StatusRecord, ServiceError> {
        Ok(self.store.status_by_name(status).await?)
    }

    pub async fn list_statuses(&self) -> Result<Vec<StatusRecord>, ServiceError> {
        Ok(self.store.statuses().await?)
    }

    pub async fn create_wrapping(&self, paper: &str, price: i32) -> Result<Wrapping, ServiceError> {
        Ok(self.store.insert_wrapping(paper, price).await?)
    }

    pub async fn update_wrapping(&self, wrapping: &Wrapping) -> Result<Wrapping, ServiceError> {
        Ok(self.store.update_wrapping(wrapping).await?)
    }

    pub async fn delete_wrapping(&self, id: i32) -> Result<(), ServiceError> {
        Ok(self.store.delete_wrapping(id).await?)
    }

    pub async fn get_wrapping(&self, id: i32) -> Result<Wrapping, ServiceError> {
        Ok(self.store.wrapping_by_id(id).await?)
    }

    pub async fn list_wrappings(&self) -> Result<Vec<Wrapping>, ServiceError> {
        Ok(self.store.wrappings().await?)
    }

    pub async fn create_delivery_policy(
        &self,
        name: &str,
        policy_price: i32,
        standard_price: i32,
    ) -> Result<DeliveryPolicy, ServiceError> {
        Ok(self
            .store
            .insert_delivery_policy(name, policy_price, standard_price)
            .await?)
    }

    pub async fn update_delivery_policy(
        &self,
        policy: &DeliveryPolicy,
    ) -> Result<DeliveryPolicy, ServiceError> {
        Ok(self.store.update_delivery_policy(policy).await?)
    }

    pub async fn delete_delivery_policy(&self, id: i32) -> Result<(), ServiceError> {
        Ok(self.store.delete_delivery_policy(id).await?)
    }

    pub async fn get_delivery_policy(&self, id: i32) -> Result<DeliveryPolicy, ServiceError> {
        Ok(self.store.delivery_policy_by_id(id).await?)
    }

    pub async fn list_delivery_policies(&self) -> Result<Vec<DeliveryPolicy>, ServiceError> {
        Ok(self.store.delivery_policies().await?)
    }

    // ------------------------------------------------------------------

    async fn assemble_view(
        &self,
        order: Order,
        details: Vec<OrderDetail>,
    ) -> Result<OrderView, ServiceError> {
        let mut views = Vec::with_capacity(details.len());
        for detail in details {
            let product = self.store.product_by_id(detail.product_id).await?;
            let wrapping = self.store.wrapping_by_id(detail.wrapping_id).await?;
            views.push(OrderDetailView {
                id: detail.id,
                price: detail.price,
                quantity: detail.quantity,
                wrap: detail.wrap,
                created_at: detail.created_at,
                status: detail.status,
                wrapping,
                product,
            });
        }
        Ok(OrderView::from_order(order, views))
    }
}

// ============================================================================
// Tests
// ============================================================================
