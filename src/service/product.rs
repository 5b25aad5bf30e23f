use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::catalog::{NewProduct, Product};
use crate::domain::order::Page;
use crate::errors::ServiceError;
use crate::repository::Store;

// ============================================================================
// Product Service
// ============================================================================

pub struct ProductService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> ProductService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, ServiceError> {
        let created = self.store.insert_product(product).await?;
        info!(product_id = created.id, name = %created.name, "product created");
        Ok(created)
    }

    pub async fn get_product(&self, id: i32) -> Result<Product, ServiceError> {
        Ok(self.store.product_by_id(id).await?)
    }

    /// Pages are 1-based; `total` is the full catalog size.
    pub async fn list_products(&self, page: u32, size: u32) -> Result<Page<Product>, ServiceError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(size);
        let (items, total) = self.store.products(offset, i64::from(size)).await?;
        Ok(Page { items, total })
    }

    pub async fn update_product(&self, product: &Product) -> Result<Product, ServiceError> {
        Ok(self.store.update_product(product).await?)
    }

    /// Restocks through the domain guard so a non-positive quantity is
    /// rejected before the store is touched.
    #[instrument(skip(self))]
    pub async fn add_stock(&self, id: i32, quantity: i32) -> Result<Product, ServiceError> {
        let mut product = self.store.product_by_id(id).await?;
        if quantity <= 0 {
            return Err(crate::domain::catalog::CatalogError::InvalidQuantity(quantity).into());
        }
        product.increase_stock(quantity);
        Ok(self.store.update_product(&product).await?)
    }

    /// Manual stock removal, bounded by what is on hand.
    #[instrument(skip(self))]
    pub async fn remove_stock(&self, id: i32, quantity: i32) -> Result<Product, ServiceError> {
        let mut product = self.store.product_by_id(id).await?;
        product.decrease_stock(quantity)?;
        Ok(self.store.update_product(&product).await?)
    }
}

// ============================================================================
// Tests
// ============================================================================
