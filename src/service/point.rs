use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::point::{earned_points, next_balance, NewPointLog, PointLog, PointPolicy};
use crate::errors::ServiceError;
use crate::repository::Store;

// ============================================================================
// Point Service
// ============================================================================
//
// Accrual is append-only: each log row carries the delta and the running
// balance, and the current balance is whatever the newest row says.
//
// ============================================================================

pub struct PointService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> PointService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    pub async fn create_policy(
        &self,
        name: &str,
        point: i32,
        rate: f64,
    ) -> Result<PointPolicy, ServiceError> {
        Ok(self.store.insert_point_policy(name, point, rate).await?)
    }

    pub async fn update_policy(
        &self,
        id: i32,
        point: i32,
        rate: f64,
    ) -> Result<(), ServiceError> {
        Ok(self.store.update_point_policy(id, point, rate).await?)
    }

    /// Soft delete: the policy stays in the listing but no longer resolves
    /// by name.
    pub async fn delete_policy(&self, id: i32) -> Result<(), ServiceError> {
        Ok(self.store.delete_point_policy(id).await?)
    }

    pub async fn list_policies(&self) -> Result<Vec<PointPolicy>, ServiceError> {
        Ok(self.store.point_policies().await?)
    }

    // ------------------------------------------------------------------
    // Accrual
    // ------------------------------------------------------------------

    /// Awards points for a purchase under the named policy, stacking the
    /// caller's grade benefit on top of the policy rate.
    #[instrument(skip(self))]
    pub async fn accrue_for_order(
        &self,
        login_id: &str,
        inquiry: &str,
        price: i32,
        policy_name: &str,
    ) -> Result<PointLog, ServiceError> {
        let user = self.store.user_by_login(login_id).await?;
        let policy = self.store.point_policy_by_name(policy_name).await?;

        let delta = earned_points(price, policy.rate, user.grade.benefit());
        let previous = self
            .store
            .latest_point_log(user.id)
            .await?
            .map(|log| log.balance);
        let balance = next_balance(previous, delta);

        let log = self
            .store
            .insert_point_log(NewPointLog {
                user_id: user.id,
                inquiry: inquiry.to_string(),
                delta,
                balance,
            })
            .await?;
        info!(user_id = user.id, delta, balance, "points accrued");
        Ok(log)
    }

    /// Newest first, 1-based pages.
    pub async fn logs(&self, page: u32, size: u32) -> Result<Vec<PointLog>, ServiceError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(size);
        Ok(self.store.point_logs(offset, i64::from(size)).await?)
    }
}

// ============================================================================
// Tests
// ============================================================================
