use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
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
// PostgreSQL Store
// ============================================================================
//
// All multi-step mutations run inside one transaction. Product stock is
// guarded with conditional UPDATEs (`FOR UPDATE` on the price snapshot,
// `stock >= $q` on the decrement). Detail status writes are compare-and-set
// against the status the caller read before deciding the transition, so of
// two transitions computed from the same snapshot only one commits; the
// loser gets `DetailConflict` and is never retried here.
//
// ============================================================================

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        login_id TEXT UNIQUE NOT NULL,
        email TEXT NOT NULL,
        grade TEXT NOT NULL DEFAULT 'NORMAL'
    )",
    "CREATE TABLE IF NOT EXISTS order_statuses (
        id SERIAL PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS wrappings (
        id SERIAL PRIMARY KEY,
        paper TEXT NOT NULL,
        price INT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS delivery_policies (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        policy_price INT NOT NULL,
        standard_price INT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        price INT NOT NULL,
        stock INT NOT NULL CHECK (stock >= 0)
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id BIGSERIAL PRIMARY KEY,
        token UUID UNIQUE NOT NULL,
        address TEXT NOT NULL,
        address_detail TEXT NOT NULL,
        zipcode TEXT NOT NULL,
        receiver TEXT NOT NULL,
        sender TEXT NOT NULL,
        request TEXT,
        delivery_rate INT NOT NULL,
        price INT NOT NULL,
        login_id TEXT,
        order_email TEXT,
        coupon_code TEXT
    )",
    "CREATE TABLE IF NOT EXISTS order_details (
        id BIGSERIAL PRIMARY KEY,
        order_id BIGINT NOT NULL REFERENCES orders(id),
        product_id INT NOT NULL REFERENCES products(id),
        wrapping_id INT NOT NULL REFERENCES wrappings(id),
        status TEXT NOT NULL,
        price INT NOT NULL,
        quantity INT NOT NULL CHECK (quantity > 0),
        wrap BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ
    )",
    "CREATE TABLE IF NOT EXISTS point_policies (
        id SERIAL PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        point INT NOT NULL,
        rate DOUBLE PRECISION NOT NULL,
        deleted BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE TABLE IF NOT EXISTS point_logs (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        inquiry TEXT NOT NULL,
        delta INT NOT NULL,
        balance INT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
];

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create missing tables and seed the reference data: every lifecycle
    /// status plus the UNPACKAGED sentinel wrapping.
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }

        for status in OrderStatus::ALL {
            sqlx::query(
                "INSERT INTO order_statuses (name, updated_at) VALUES ($1, $2)
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            "INSERT INTO wrappings (id, paper, price) VALUES ($1, 'UNPACKAGED', 0)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(UNPACKAGED_WRAPPING_ID)
        .execute(&self.pool)
        .await?;
        sqlx::query("SELECT setval('wrappings_id_seq', (SELECT MAX(id) FROM wrappings))")
            .execute(&self.pool)
            .await?;

        tracing::info!("Schema bootstrap complete");
        Ok(())
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    Ok(Order {
        id: row.try_get("id")?,
        token: row.try_get("token")?,
        address: row.try_get("address")?,
        address_detail: row.try_get("address_detail")?,
        zipcode: row.try_get("zipcode")?,
        receiver: row.try_get("receiver")?,
        sender: row.try_get("sender")?,
        request: row.try_get("request")?,
        delivery_rate: row.try_get("delivery_rate")?,
        price: row.try_get("price")?,
        login_id: row.try_get("login_id")?,
        order_email: row.try_get("order_email")?,
        coupon_code: row.try_get("coupon_code")?,
    })
}

fn detail_from_row(row: &PgRow) -> Result<OrderDetail, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(OrderDetail {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        wrapping_id: row.try_get("wrapping_id")?,
        status: status.parse()?,
        price: row.try_get("price")?,
        quantity: row.try_get("quantity")?,
        wrap: row.try_get("wrap")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn status_from_row(row: &PgRow) -> Result<StatusRecord, StoreError> {
    let name: String = row.try_get("name")?;
    Ok(StatusRecord {
        id: row.try_get("id")?,
        status: name.parse()?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<UserAccount, StoreError> {
    let grade: String = row.try_get("grade")?;
    Ok(UserAccount {
        id: row.try_get("id")?,
        login_id: row.try_get("login_id")?,
        email: row.try_get("email")?,
        grade: grade.parse()?,
    })
}

const DETAIL_COLUMNS: &str =
    "id, order_id, product_id, wrapping_id, status, price, quantity, wrap, created_at, updated_at";

// Qualified variant for queries that join orders.
const DETAIL_COLUMNS_QUALIFIED: &str = "d.id, d.order_id, d.product_id, d.wrapping_id, d.status, \
                                        d.price, d.quantity, d.wrap, d.created_at, d.updated_at";

#[async_trait]
impl OrderRepo for PgStore {
    async fn insert_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<(Order, Vec<OrderDetail>), StoreError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let order_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (token, address, address_detail, zipcode, receiver, sender,
                                 request, delivery_rate, price, login_id, order_email, coupon_code)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING id",
        )
        .bind(order.token)
        .bind(&order.address)
        .bind(&order.address_detail)
        .bind(&order.zipcode)
        .bind(&order.receiver)
        .bind(&order.sender)
        .bind(&order.request)
        .bind(order.delivery_rate)
        .bind(order.price)
        .bind(&order.login_id)
        .bind(&order.order_email)
        .bind(&order.coupon_code)
        .fetch_one(&mut *tx)
        .await?;

        let mut details = Vec::with_capacity(lines.len());

        for line in &lines {
            let wrapping_id = line.wrapping_id.unwrap_or(UNPACKAGED_WRAPPING_ID);
            let wrapping_exists: Option<i32> =
                sqlx::query_scalar("SELECT id FROM wrappings WHERE id = $1")
                    .bind(wrapping_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if wrapping_exists.is_none() {
                return Err(StoreError::WrappingNotFound(wrapping_id));
            }

            // Lock the product row; the snapshot price and the decrement must
            // see the same state.
            let unit_price: Option<i32> =
                sqlx::query_scalar("SELECT price FROM products WHERE id = $1 FOR UPDATE")
                    .bind(line.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let unit_price = unit_price.ok_or(StoreError::ProductNotFound(line.product_id))?;

            let decremented =
                sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1")
                    .bind(line.quantity)
                    .bind(line.product_id)
                    .execute(&mut *tx)
                    .await?;
            if decremented.rows_affected() == 0 {
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                });
            }

            let detail_id: i64 = sqlx::query_scalar(
                "INSERT INTO order_details (order_id, product_id, wrapping_id, status, price,
                                            quantity, wrap, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING id",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(wrapping_id)
            .bind(line.status.as_str())
            .bind(unit_price)
            .bind(line.quantity)
            .bind(line.wrap)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            details.push(OrderDetail {
                id: detail_id,
                order_id,
                product_id: line.product_id,
                wrapping_id,
                status: line.status,
                price: unit_price,
                quantity: line.quantity,
                wrap: line.wrap,
                created_at: now,
                updated_at: None,
            });
        }

        tx.commit().await?;

        Ok((
            Order {
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
            },
            details,
        ))
    }

    async fn order_by_token(&self, token: Uuid) -> Result<Order, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::OrderNotFound)?;
        order_from_row(&row)
    }

    async fn details_for_order(&self, order_id: i64) -> Result<Vec<OrderDetail>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM order_details WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(detail_from_row).collect()
    }

    async fn details_for_order_and_login(
        &self,
        order_id: i64,
        login_id: &str,
    ) -> Result<Vec<OrderDetail>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS_QUALIFIED} FROM order_details d
             JOIN orders o ON o.id = d.order_id
             WHERE d.order_id = $1 AND o.login_id = $2
             ORDER BY d.id"
        ))
        .bind(order_id)
        .bind(login_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(detail_from_row).collect()
    }

    async fn details_for_order_and_email(
        &self,
        order_id: i64,
        order_email: &str,
    ) -> Result<Vec<OrderDetail>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS_QUALIFIED} FROM order_details d
             JOIN orders o ON o.id = d.order_id
             WHERE d.order_id = $1 AND o.order_email = $2
             ORDER BY d.id"
        ))
        .bind(order_id)
        .bind(order_email)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(detail_from_row).collect()
    }

    async fn detail_by_id(&self, detail_id: i64) -> Result<OrderDetail, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM order_details WHERE id = $1"
        ))
        .bind(detail_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::OrderDetailNotFound)?;
        detail_from_row(&row)
    }

    async fn detail_by_id_and_login(
        &self,
        detail_id: i64,
        login_id: &str,
    ) -> Result<OrderDetail, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS_QUALIFIED} FROM order_details d
             JOIN orders o ON o.id = d.order_id
             WHERE d.id = $1 AND o.login_id = $2"
        ))
        .bind(detail_id)
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::OrderDetailNotFound)?;
        detail_from_row(&row)
    }

    async fn token_for_detail(&self, detail_id: i64) -> Result<Uuid, StoreError> {
        sqlx::query_scalar(
            "SELECT o.token FROM order_details d
             JOIN orders o ON o.id = d.order_id
             WHERE d.id = $1",
        )
        .bind(detail_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::OrderDetailNotFound)
    }

    async fn commit_transition(
        &self,
        updates: &[DetailStatusUpdate],
        restocks: &[(i32, i32)],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for update in updates {
            // Compare-and-set: refuse the write if the detail moved since the
            // caller read it, otherwise a lost refund double-restocks.
            let result = sqlx::query(
                "UPDATE order_details SET status = $1, updated_at = $2
                 WHERE id = $3 AND status = $4",
            )
            .bind(update.status.as_str())
            .bind(update.updated_at)
            .bind(update.detail_id)
            .bind(update.prior_status.as_str())
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::DetailConflict);
            }
        }

        for (product_id, quantity) in restocks {
            let result = sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
                .bind(quantity)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::ProductNotFound(*product_id));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn flat_rows(&self, scope: OrderListScope) -> Result<Vec<OrderRow>, StoreError> {
        let base = "SELECT o.id AS order_id, o.token, o.address, o.address_detail, o.zipcode,
                           o.receiver, o.sender, o.request, o.delivery_rate,
                           o.price AS order_price, o.login_id, o.order_email, o.coupon_code,
                           d.id AS detail_id, d.status, d.price AS detail_price, d.quantity,
                           d.wrap, d.created_at,
                           p.id AS product_id, p.name AS product_name,
                           p.price AS product_price, p.stock,
                           w.id AS wrapping_id, w.paper, w.price AS wrapping_price
                    FROM order_details d
                    JOIN orders o ON o.id = d.order_id
                    JOIN products p ON p.id = d.product_id
                    JOIN wrappings w ON w.id = d.wrapping_id";

        let rows = match &scope {
            OrderListScope::All => {
                sqlx::query(&format!("{base} ORDER BY d.created_at, d.id"))
                    .fetch_all(&self.pool)
                    .await?
            }
            OrderListScope::Login(login_id) => {
                sqlx::query(&format!(
                    "{base} WHERE o.login_id = $1 ORDER BY d.created_at, d.id"
                ))
                .bind(login_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(OrderRow {
                    order: Order {
                        id: row.try_get("order_id")?,
                        token: row.try_get("token")?,
                        address: row.try_get("address")?,
                        address_detail: row.try_get("address_detail")?,
                        zipcode: row.try_get("zipcode")?,
                        receiver: row.try_get("receiver")?,
                        sender: row.try_get("sender")?,
                        request: row.try_get("request")?,
                        delivery_rate: row.try_get("delivery_rate")?,
                        price: row.try_get("order_price")?,
                        login_id: row.try_get("login_id")?,
                        order_email: row.try_get("order_email")?,
                        coupon_code: row.try_get("coupon_code")?,
                    },
                    detail: OrderDetailView {
                        id: row.try_get("detail_id")?,
                        price: row.try_get("detail_price")?,
                        quantity: row.try_get("quantity")?,
                        wrap: row.try_get("wrap")?,
                        created_at: row.try_get("created_at")?,
                        status: status.parse()?,
                        wrapping: Wrapping {
                            id: row.try_get("wrapping_id")?,
                            paper: row.try_get("paper")?,
                            price: row.try_get("wrapping_price")?,
                        },
                        product: Product {
                            id: row.try_get("product_id")?,
                            name: row.try_get("product_name")?,
                            price: row.try_get("product_price")?,
                            stock: row.try_get("stock")?,
                        },
                    },
                })
            })
            .collect()
    }
}

#[async_trait]
impl CatalogRepo for PgStore {
    async fn product_by_id(&self, id: i32) -> Result<Product, StoreError> {
        sqlx::query_as::<_, Product>("SELECT id, name, price, stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::ProductNotFound(id))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO products (name, price, stock) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await?;
        Ok(Product {
            id,
            name: product.name,
            price: product.price,
            stock: product.stock,
        })
    }

    async fn update_product(&self, product: &Product) -> Result<Product, StoreError> {
        let result =
            sqlx::query("UPDATE products SET name = $1, price = $2, stock = $3 WHERE id = $4")
                .bind(&product.name)
                .bind(product.price)
                .bind(product.stock)
                .bind(product.id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(product.id));
        }
        Ok(product.clone())
    }

    async fn products(&self, offset: i64, limit: i64) -> Result<(Vec<Product>, u64), StoreError> {
        let items = sqlx::query_as::<_, Product>(
            "SELECT id, name, price, stock FROM products ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok((items, total as u64))
    }

    async fn wrapping_by_id(&self, id: i32) -> Result<Wrapping, StoreError> {
        sqlx::query_as::<_, Wrapping>("SELECT id, paper, price FROM wrappings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::WrappingNotFound(id))
    }

    async fn insert_wrapping(&self, paper: &str, price: i32) -> Result<Wrapping, StoreError> {
        let id: i32 =
            sqlx::query_scalar("INSERT INTO wrappings (paper, price) VALUES ($1, $2) RETURNING id")
                .bind(paper)
                .bind(price)
                .fetch_one(&self.pool)
                .await?;
        Ok(Wrapping {
            id,
            paper: paper.to_string(),
            price,
        })
    }

    async fn update_wrapping(&self, wrapping: &Wrapping) -> Result<Wrapping, StoreError> {
        let result = sqlx::query("UPDATE wrappings SET paper = $1, price = $2 WHERE id = $3")
            .bind(&wrapping.paper)
            .bind(wrapping.price)
            .bind(wrapping.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::WrappingNotFound(wrapping.id));
        }
        Ok(wrapping.clone())
    }

    async fn delete_wrapping(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM wrappings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::WrappingNotFound(id));
        }
        Ok(())
    }

    async fn wrappings(&self) -> Result<Vec<Wrapping>, StoreError> {
        Ok(
            sqlx::query_as::<_, Wrapping>("SELECT id, paper, price FROM wrappings ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn delivery_policy_by_id(&self, id: i32) -> Result<DeliveryPolicy, StoreError> {
        sqlx::query_as::<_, DeliveryPolicy>(
            "SELECT id, name, policy_price, standard_price FROM delivery_policies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::DeliveryPolicyNotFound(id))
    }

    async fn insert_delivery_policy(
        &self,
        name: &str,
        policy_price: i32,
        standard_price: i32,
    ) -> Result<DeliveryPolicy, StoreError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO delivery_policies (name, policy_price, standard_price)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(policy_price)
        .bind(standard_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(DeliveryPolicy {
            id,
            name: name.to_string(),
            policy_price,
            standard_price,
        })
    }

    async fn update_delivery_policy(
        &self,
        policy: &DeliveryPolicy,
    ) -> Result<DeliveryPolicy, StoreError> {
        let result = sqlx::query(
            "UPDATE delivery_policies SET name = $1, policy_price = $2, standard_price = $3
             WHERE id = $4",
        )
        .bind(&policy.name)
        .bind(policy.policy_price)
        .bind(policy.standard_price)
        .bind(policy.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::DeliveryPolicyNotFound(policy.id));
        }
        Ok(policy.clone())
    }

    async fn delete_delivery_policy(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM delivery_policies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::DeliveryPolicyNotFound(id));
        }
        Ok(())
    }

    async fn delivery_policies(&self) -> Result<Vec<DeliveryPolicy>, StoreError> {
        Ok(sqlx::query_as::<_, DeliveryPolicy>(
            "SELECT id, name, policy_price, standard_price FROM delivery_policies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl StatusRepo for PgStore {
    async fn insert_status(&self, status: OrderStatus) -> Result<StatusRecord, StoreError> {
        let now = Utc::now();
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO order_statuses (name, updated_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(status.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(StatusRecord {
            id,
            status,
            updated_at: now,
        })
    }

    async fn update_status(&self, id: i32, status: OrderStatus) -> Result<StatusRecord, StoreError> {
        let now = Utc::now();
        let result = sqlx::query("UPDATE order_statuses SET name = $1, updated_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::StatusNotFound);
        }
        Ok(StatusRecord {
            id,
            status,
            updated_at: now,
        })
    }

    async fn delete_status(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM order_statuses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::StatusNotFound);
        }
        Ok(())
    }

    async fn status_by_id(&self, id: i32) -> Result<StatusRecord, StoreError> {
        let row = sqlx::query("SELECT id, name, updated_at FROM order_statuses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::StatusNotFound)?;
        status_from_row(&row)
    }

    async fn status_by_name(&self, status: OrderStatus) -> Result<StatusRecord, StoreError> {
        let row = sqlx::query("SELECT id, name, updated_at FROM order_statuses WHERE name = $1")
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::StatusNotFound)?;
        status_from_row(&row)
    }

    async fn statuses(&self) -> Result<Vec<StatusRecord>, StoreError> {
        let rows = sqlx::query("SELECT id, name, updated_at FROM order_statuses ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(status_from_row).collect()
    }
}

#[async_trait]
impl PointRepo for PgStore {
    async fn insert_point_policy(
        &self,
        name: &str,
        point: i32,
        rate: f64,
    ) -> Result<PointPolicy, StoreError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO point_policies (name, point, rate) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(point)
        .bind(rate)
        .fetch_one(&self.pool)
        .await?;
        Ok(PointPolicy {
            id,
            name: name.to_string(),
            point,
            rate,
            deleted: false,
        })
    }

    async fn update_point_policy(&self, id: i32, point: i32, rate: f64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE point_policies SET point = $1, rate = $2 WHERE id = $3")
            .bind(point)
            .bind(rate)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::PointPolicyNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_point_policy(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE point_policies SET deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::PointPolicyNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn point_policies(&self) -> Result<Vec<PointPolicy>, StoreError> {
        Ok(sqlx::query_as::<_, PointPolicy>(
            "SELECT id, name, point, rate, deleted FROM point_policies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn point_policy_by_name(&self, name: &str) -> Result<PointPolicy, StoreError> {
        sqlx::query_as::<_, PointPolicy>(
            "SELECT id, name, point, rate, deleted FROM point_policies
             WHERE name = $1 AND deleted = FALSE",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::PointPolicyNotFound(name.to_string()))
    }

    async fn latest_point_log(&self, user_id: i64) -> Result<Option<PointLog>, StoreError> {
        Ok(sqlx::query_as::<_, PointLog>(
            "SELECT id, user_id, inquiry, delta, balance, created_at FROM point_logs
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_point_log(&self, log: NewPointLog) -> Result<PointLog, StoreError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO point_logs (user_id, inquiry, delta, balance, created_at)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(log.user_id)
        .bind(&log.inquiry)
        .bind(log.delta)
        .bind(log.balance)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(PointLog {
            id,
            user_id: log.user_id,
            inquiry: log.inquiry,
            delta: log.delta,
            balance: log.balance,
            created_at: now,
        })
    }

    async fn point_logs(&self, offset: i64, limit: i64) -> Result<Vec<PointLog>, StoreError> {
        Ok(sqlx::query_as::<_, PointLog>(
            "SELECT id, user_id, inquiry, delta, balance, created_at FROM point_logs
             ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl UserRepo for PgStore {
    async fn user_by_login(&self, login_id: &str) -> Result<UserAccount, StoreError> {
        let row = sqlx::query("SELECT id, login_id, email, grade FROM users WHERE login_id = $1")
            .bind(login_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::UserNotFound(login_id.to_string()))?;
        user_from_row(&row)
    }

    async fn upsert_user(
        &self,
        login_id: &str,
        email: &str,
        grade: Grade,
    ) -> Result<UserAccount, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (login_id, email, grade) VALUES ($1, $2, $3)
             ON CONFLICT (login_id) DO UPDATE SET email = EXCLUDED.email, grade = EXCLUDED.grade
             RETURNING id",
        )
        .bind(login_id)
        .bind(email)
        .bind(grade.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(UserAccount {
            id,
            login_id: login_id.to_string(),
            email: email.to_string(),
            grade,
        })
    }
}
