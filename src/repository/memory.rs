use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::catalog::{
    DeliveryPolicy, NewProduct, Product, Wrapping, UNPACKAGED_WRAPPING_ID,
};
use crate::domain::order::{
    DetailStatusUpdate, NewOrder, NewOrderLine, Order, OrderDetail, OrderDetailView, OrderRow,
    OrderStatus, StatusRecord,
};
use crate::domain::point::{NewPointLog, PointLog, PointPolicy};
use crate::domain::user::{Grade, UserAccount};

use super::{
    CatalogRepo, OrderListScope, OrderRepo, PointRepo, StatusRepo, StoreError, UserRepo,
};

// ============================================================================
// In-Memory Store (test support)
// ============================================================================
//
// Map-backed implementation of the repository traits behind one async mutex,
// which doubles as the "transaction": a multi-step mutation holds the lock
// for its whole duration, so service tests see the same all-or-nothing
// behavior the Postgres store provides.
//
// ============================================================================

#[derive(Default)]
struct Inner {
    orders: Vec<Order>,
    details: Vec<OrderDetail>,
    products: HashMap<i32, Product>,
    wrappings: HashMap<i32, Wrapping>,
    delivery_policies: HashMap<i32, DeliveryPolicy>,
    statuses: Vec<StatusRecord>,
    users: Vec<UserAccount>,
    point_policies: Vec<PointPolicy>,
    point_logs: Vec<PointLog>,
    next_order_id: i64,
    next_detail_id: i64,
    next_product_id: i32,
    next_wrapping_id: i32,
    next_delivery_policy_id: i32,
    next_status_id: i32,
    next_user_id: i64,
    next_point_policy_id: i32,
    next_point_log_id: i64,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Seeded the way `PgStore::bootstrap` seeds: all lifecycle statuses plus
    /// the UNPACKAGED sentinel wrapping.
    pub fn new() -> Self {
        let mut inner = Inner {
            next_order_id: 1,
            next_detail_id: 1,
            next_product_id: 1,
            next_wrapping_id: 2,
            next_delivery_policy_id: 1,
            next_status_id: 1,
            next_user_id: 1,
            next_point_policy_id: 1,
            next_point_log_id: 1,
            ..Inner::default()
        };

        for status in OrderStatus::ALL {
            let id = inner.next_status_id;
            inner.next_status_id += 1;
            inner.statuses.push(StatusRecord {
                id,
                status,
                updated_at: Utc::now(),
            });
        }

        inner.wrappings.insert(
            UNPACKAGED_WRAPPING_ID,
            Wrapping {
                id: UNPACKAGED_WRAPPING_ID,
                paper: "UNPACKAGED".to_string(),
                price: 0,
            },
        );

        Self {
            inner: Mutex::new(inner),
        }
    }
}

#[async_trait]
impl OrderRepo for MemoryStore {
    async fn insert_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<(Order, Vec<OrderDetail>), StoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();

        // Validate every line on a scratch copy of the stock counters before
        // touching anything: all-or-nothing.
        let mut scratch = inner.products.clone();
        for line in &lines {
            let wrapping_id = line.wrapping_id.unwrap_or(UNPACKAGED_WRAPPING_ID);
            if !inner.wrappings.contains_key(&wrapping_id) {
                return Err(StoreError::WrappingNotFound(wrapping_id));
            }
            let product = scratch
                .get_mut(&line.product_id)
                .ok_or(StoreError::ProductNotFound(line.product_id))?;
            product
                .decrease_stock(line.quantity)
                .map_err(|_| StoreError::InsufficientStock {
                    product_id: line.product_id,
                })?;
        }
        inner.products = scratch;

        let order_id = inner.next_order_id;
        inner.next_order_id += 1;
        let stored = Order {
            id: order_id,
            token: order.token,
            address: order.address,
            address_detail: order.address_detail,
            zipcode: order.zipcode,
            receiver: order.receiver,
            sender: order.sender,
            request: order.request,
            delivery_rate: order.delivery_rate,
            price: order.price,
            login_id: order.login_id,
            order_email: order.order_email,
            coupon_code: order.coupon_code,
        };
        inner.orders.push(stored.clone());

        let mut details = Vec::with_capacity(lines.len());
        for line in lines {
            let detail_id = inner.next_detail_id;
            inner.next_detail_id += 1;
            let unit_price = inner.products[&line.product_id].price;
            let detail = OrderDetail {
                id: detail_id,
                order_id,
                product_id: line.product_id,
                wrapping_id: line.wrapping_id.unwrap_or(UNPACKAGED_WRAPPING_ID),
                status: line.status,
                price: unit_price,
                quantity: line.quantity,
                wrap: line.wrap,
                created_at: now,
                updated_at: None,
            };
            inner.details.push(detail.clone());
            details.push(detail);
        }

        Ok((stored, details))
    }

    async fn order_by_token(&self, token: Uuid) -> Result<Order, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .orders
            .iter()
            .find(|o| o.token == token)
            .cloned()
            .ok_or(StoreError::OrderNotFound)
    }

    async fn details_for_order(&self, order_id: i64) -> Result<Vec<OrderDetail>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .details
            .iter()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn details_for_order_and_login(
        &self,
        order_id: i64,
        login_id: &str,
    ) -> Result<Vec<OrderDetail>, StoreError> {
        let inner = self.inner.lock().await;
        let owned = inner
            .orders
            .iter()
            .any(|o| o.id == order_id && o.login_id.as_deref() == Some(login_id));
        if !owned {
            return Ok(Vec::new());
        }
        Ok(inner
            .details
            .iter()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn details_for_order_and_email(
        &self,
        order_id: i64,
        order_email: &str,
    ) -> Result<Vec<OrderDetail>, StoreError> {
        let inner = self.inner.lock().await;
        let owned = inner
            .orders
            .iter()
            .any(|o| o.id == order_id && o.order_email.as_deref() == Some(order_email));
        if !owned {
            return Ok(Vec::new());
        }
        Ok(inner
            .details
            .iter()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn detail_by_id(&self, detail_id: i64) -> Result<OrderDetail, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .details
            .iter()
            .find(|d| d.id == detail_id)
            .cloned()
            .ok_or(StoreError::OrderDetailNotFound)
    }

    async fn detail_by_id_and_login(
        &self,
        detail_id: i64,
        login_id: &str,
    ) -> Result<OrderDetail, StoreError> {
        let inner = self.inner.lock().await;
        let detail = inner
            .details
            .iter()
            .find(|d| d.id == detail_id)
            .ok_or(StoreError::OrderDetailNotFound)?;
        let owned = inner
            .orders
            .iter()
            .any(|o| o.id == detail.order_id && o.login_id.as_deref() == Some(login_id));
        if !owned {
            return Err(StoreError::OrderDetailNotFound);
        }
        Ok(detail.clone())
    }

    async fn token_for_detail(&self, detail_id: i64) -> Result<Uuid, StoreError> {
        let inner = self.inner.lock().await;
        let detail = inner
            .details
            .iter()
            .find(|d| d.id == detail_id)
            .ok_or(StoreError::OrderDetailNotFound)?;
        inner
            .orders
            .iter()
            .find(|o| o.id == detail.order_id)
            .map(|o| o.token)
            .ok_or(StoreError::OrderNotFound)
    }

    async fn commit_transition(
        &self,
        updates: &[DetailStatusUpdate],
        restocks: &[(i32, i32)],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        // Compare-and-set against the status the caller read; refuse the
        // whole batch before touching anything, like a rolled-back
        // transaction.
        for update in updates {
            let detail = inner
                .details
                .iter()
                .find(|d| d.id == update.detail_id)
                .ok_or(StoreError::OrderDetailNotFound)?;
            if detail.status != update.prior_status {
                return Err(StoreError::DetailConflict);
            }
        }

        for update in updates {
            let detail = inner
                .details
                .iter_mut()
                .find(|d| d.id == update.detail_id)
                .ok_or(StoreError::OrderDetailNotFound)?;
            detail.status = update.status;
            detail.updated_at = Some(update.updated_at);
        }

        for (product_id, quantity) in restocks {
            let product = inner
                .products
                .get_mut(product_id)
                .ok_or(StoreError::ProductNotFound(*product_id))?;
            product.increase_stock(*quantity);
        }

        Ok(())
    }

    async fn flat_rows(&self, scope: OrderListScope) -> Result<Vec<OrderRow>, StoreError> {
        let inner = self.inner.lock().await;

        let mut details: Vec<&OrderDetail> = inner.details.iter().collect();
        details.sort_by_key(|d| (d.created_at, d.id));

        let mut rows = Vec::new();
        for detail in details {
            let order = inner
                .orders
                .iter()
                .find(|o| o.id == detail.order_id)
                .ok_or(StoreError::OrderNotFound)?;
            if let OrderListScope::Login(login_id) = &scope {
                if order.login_id.as_deref() != Some(login_id.as_str()) {
                    continue;
                }
            }
            let product = inner
                .products
                .get(&detail.product_id)
                .ok_or(StoreError::ProductNotFound(detail.product_id))?;
            let wrapping = inner
                .wrappings
                .get(&detail.wrapping_id)
                .ok_or(StoreError::WrappingNotFound(detail.wrapping_id))?;

            rows.push(OrderRow {
                order: order.clone(),
                detail: OrderDetailView {
                    id: detail.id,
                    price: detail.price,
                    quantity: detail.quantity,
                    wrap: detail.wrap,
                    created_at: detail.created_at,
                    status: detail.status,
                    wrapping: wrapping.clone(),
                    product: product.clone(),
                },
            });
        }

        Ok(rows)
    }
}

#[async_trait]
impl CatalogRepo for MemoryStore {
    async fn product_by_id(&self, id: i32) -> Result<Product, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProductNotFound(id))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_product_id;
        inner.next_product_id += 1;
        let stored = Product {
            id,
            name: product.name,
            price: product.price,
            stock: product.stock,
        };
        inner.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_product(&self, product: &Product) -> Result<Product, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.products.contains_key(&product.id) {
            return Err(StoreError::ProductNotFound(product.id));
        }
        inner.products.insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn products(&self, offset: i64, limit: i64) -> Result<(Vec<Product>, u64), StoreError> {
        let inner = self.inner.lock().await;
        let mut all: Vec<Product> = inner.products.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((items, total))
    }

    async fn wrapping_by_id(&self, id: i32) -> Result<Wrapping, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .wrappings
            .get(&id)
            .cloned()
            .ok_or(StoreError::WrappingNotFound(id))
    }

    async fn insert_wrapping(&self, paper: &str, price: i32) -> Result<Wrapping, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_wrapping_id;
        inner.next_wrapping_id += 1;
        let stored = Wrapping {
            id,
            paper: paper.to_string(),
            price,
        };
        inner.wrappings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_wrapping(&self, wrapping: &Wrapping) -> Result<Wrapping, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.wrappings.contains_key(&wrapping.id) {
            return Err(StoreError::WrappingNotFound(wrapping.id));
        }
        inner.wrappings.insert(wrapping.id, wrapping.clone());
        Ok(wrapping.clone())
    }

    async fn delete_wrapping(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .wrappings
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::WrappingNotFound(id))
    }

    async fn wrappings(&self) -> Result<Vec<Wrapping>, StoreError> {
        let inner = self.inner.lock().await;
        let mut all: Vec<Wrapping> = inner.wrappings.values().cloned().collect();
        all.sort_by_key(|w| w.id);
        Ok(all)
    }

    async fn delivery_policy_by_id(&self, id: i32) -> Result<DeliveryPolicy, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .delivery_policies
            .get(&id)
            .cloned()
            .ok_or(StoreError::DeliveryPolicyNotFound(id))
    }

    async fn insert_delivery_policy(
        &self,
        name: &str,
        policy_price: i32,
        standard_price: i32,
    ) -> Result<DeliveryPolicy, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_delivery_policy_id;
        inner.next_delivery_policy_id += 1;
        let stored = DeliveryPolicy {
            id,
            name: name.to_string(),
            policy_price,
            standard_price,
        };
        inner.delivery_policies.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_delivery_policy(
        &self,
        policy: &DeliveryPolicy,
    ) -> Result<DeliveryPolicy, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.delivery_policies.contains_key(&policy.id) {
            return Err(StoreError::DeliveryPolicyNotFound(policy.id));
        }
        inner.delivery_policies.insert(policy.id, policy.clone());
        Ok(policy.clone())
    }

    async fn delete_delivery_policy(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .delivery_policies
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::DeliveryPolicyNotFound(id))
    }

    async fn delivery_policies(&self) -> Result<Vec<DeliveryPolicy>, StoreError> {
        let inner = self.inner.lock().await;
        let mut all: Vec<DeliveryPolicy> = inner.delivery_policies.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }
}

#[async_trait]
impl StatusRepo for MemoryStore {
    async fn insert_status(&self, status: OrderStatus) -> Result<StatusRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_status_id;
        inner.next_status_id += 1;
        let record = StatusRecord {
            id,
            status,
            updated_at: Utc::now(),
        };
        inner.statuses.push(record.clone());
        Ok(record)
    }

    async fn update_status(&self, id: i32, status: OrderStatus) -> Result<StatusRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .statuses
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::StatusNotFound)?;
        record.status = status;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_status(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.statuses.len();
        inner.statuses.retain(|s| s.id != id);
        if inner.statuses.len() == before {
            return Err(StoreError::StatusNotFound);
        }
        Ok(())
    }

    async fn status_by_id(&self, id: i32) -> Result<StatusRecord, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .statuses
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(StoreError::StatusNotFound)
    }

    async fn status_by_name(&self, status: OrderStatus) -> Result<StatusRecord, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .statuses
            .iter()
            .find(|s| s.status == status)
            .cloned()
            .ok_or(StoreError::StatusNotFound)
    }

    async fn statuses(&self) -> Result<Vec<StatusRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.statuses.clone())
    }
}

#[async_trait]
impl PointRepo for MemoryStore {
    async fn insert_point_policy(
        &self,
        name: &str,
        point: i32,
        rate: f64,
    ) -> Result<PointPolicy, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_point_policy_id;
        inner.next_point_policy_id += 1;
        let policy = PointPolicy {
            id,
            name: name.to_string(),
            point,
            rate,
            deleted: false,
        };
        inner.point_policies.push(policy.clone());
        Ok(policy)
    }

    async fn update_point_policy(&self, id: i32, point: i32, rate: f64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let policy = inner
            .point_policies
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::PointPolicyNotFound(id.to_string()))?;
        policy.point = point;
        policy.rate = rate;
        Ok(())
    }

    async fn delete_point_policy(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let policy = inner
            .point_policies
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::PointPolicyNotFound(id.to_string()))?;
        policy.deleted = true;
        Ok(())
    }

    async fn point_policies(&self) -> Result<Vec<PointPolicy>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.point_policies.clone())
    }

    async fn point_policy_by_name(&self, name: &str) -> Result<PointPolicy, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .point_policies
            .iter()
            .find(|p| p.name == name && !p.deleted)
            .cloned()
            .ok_or_else(|| StoreError::PointPolicyNotFound(name.to_string()))
    }

    async fn latest_point_log(&self, user_id: i64) -> Result<Option<PointLog>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .point_logs
            .iter()
            .filter(|l| l.user_id == user_id)
            .max_by_key(|l| (l.created_at, l.id))
            .cloned())
    }

    async fn insert_point_log(&self, log: NewPointLog) -> Result<PointLog, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_point_log_id;
        inner.next_point_log_id += 1;
        let stored = PointLog {
            id,
            user_id: log.user_id,
            inquiry: log.inquiry,
            delta: log.delta,
            balance: log.balance,
            created_at: Utc::now(),
        };
        inner.point_logs.push(stored.clone());
        Ok(stored)
    }

    async fn point_logs(&self, offset: i64, limit: i64) -> Result<Vec<PointLog>, StoreError> {
        let inner = self.inner.lock().await;
        let mut all = inner.point_logs.clone();
        all.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn user_by_login(&self, login_id: &str) -> Result<UserAccount, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .users
            .iter()
            .find(|u| u.login_id == login_id)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(login_id.to_string()))
    }

    async fn upsert_user(
        &self,
        login_id: &str,
        email: &str,
        grade: Grade,
    ) -> Result<UserAccount, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(user) = inner.users.iter_mut().find(|u| u.login_id == login_id) {
            user.email = email.to_string();
            user.grade = grade;
            return Ok(user.clone());
        }
        let id = inner.next_user_id;
        inner.next_user_id += 1;
        let user = UserAccount {
            id,
            login_id: login_id.to_string(),
            email: email.to_string(),
            grade,
        };
        inner.users.push(user.clone());
        Ok(user)
    }
}
