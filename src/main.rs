use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cache;
mod config;
mod domain;
mod errors;
mod repository;
mod service;

use cache::CachedOrderReader;
use config::Config;
use domain::catalog::NewProduct;
use domain::order::OrderStatus;
use domain::user::Grade;
use repository::postgres::PgStore;
use repository::UserRepo;
use service::order::{CreateOrderLine, CreateOrderRequest};
use service::{Caller, OrderService, PointService, ProductService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bookstore_core=debug")),
        )
        .init();

    tracing::info!("🚀 Starting bookstore core");

    let config = Config::from_env();

    // === 1. Connect to Postgres and bootstrap the schema ===
    tracing::info!("Connecting to Postgres...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to Postgres")?;
    let store = Arc::new(PgStore::new(pool));
    store.bootstrap().await.context("schema bootstrap")?;
    tracing::info!("Schema ready");

    // === 2. Wire the services ===
    let orders = CachedOrderReader::new(OrderService::new(store.clone()));
    let products = ProductService::new(store.clone());
    let points = PointService::new(store.clone());

    // === 3. Seed demo data ===
    store
        .upsert_user("demo", "demo@example.com", Grade::Gold)
        .await?;
    let product = products
        .create_product(NewProduct {
            name: "The Little Book of Rust".to_string(),
            price: 18_000,
            stock: 20,
        })
        .await?;
    if points.list_policies().await?.is_empty() {
        points.create_policy("purchase", 0, 0.05).await?;
    }

    // === 4. Demonstrate the order lifecycle ===
    tracing::info!("📝 Demonstrating order lifecycle");

    let view = orders
        .create_order(CreateOrderRequest {
            address: "123 Main St".to_string(),
            address_detail: "Suite 500".to_string(),
            zipcode: "04524".to_string(),
            receiver: "Demo".to_string(),
            sender: "Demo".to_string(),
            request: Some("Leave at the door".to_string()),
            delivery_rate: 3_000,
            price: 36_000,
            login_id: Some("demo".to_string()),
            order_email: Some("demo@example.com".to_string()),
            coupon_code: None,
            lines: vec![CreateOrderLine {
                product_id: product.id,
                quantity: 2,
                wrapping_id: None,
                wrap: false,
            }],
        })
        .await?;
    tracing::info!("✅ Order placed: {}", view.token);

    let log = points
        .accrue_for_order("demo", &view.token.to_string(), view.price, "purchase")
        .await?;
    tracing::info!("✅ Points accrued: +{} (balance {})", log.delta, log.balance);

    // Ship it out, deliver it, then take a customer refund.
    let admin = Caller::Admin;
    orders
        .update_order_status(&admin, view.token, OrderStatus::ShippingOut)
        .await?;
    tracing::info!("✅ Order shipping out");

    orders
        .update_order_status(&admin, view.token, OrderStatus::Shipped)
        .await?;
    tracing::info!("✅ Order delivered");

    let refunded = orders
        .update_order_status(
            &Caller::User("demo".to_string()),
            view.token,
            OrderStatus::Refund,
        )
        .await?;
    tracing::info!(
        "✅ Order refunded, lines now {:?}",
        refunded
            .details
            .iter()
            .map(|d| d.status)
            .collect::<Vec<_>>()
    );

    let restocked = products.get_product(product.id).await?;
    tracing::info!("📦 Stock back at {}", restocked.stock);

    let listing = orders.read_orders(1, 10).await?;
    tracing::info!("📋 {} order(s) on record", listing.total);

    tracing::info!("🎉 Demo complete!");

    Ok(())
}
