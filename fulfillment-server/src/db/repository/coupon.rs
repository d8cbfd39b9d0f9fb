//! Coupon repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Coupon, CouponCreate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "coupon";

#[derive(Clone)]
pub struct CouponRepository {
    base: BaseRepository,
}

impl CouponRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Coupon>> {
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query("SELECT * FROM coupon ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(coupons)
    }

    pub async fn find_by_id(&self, coupon_id: &str) -> RepoResult<Option<Coupon>> {
        let coupon: Option<Coupon> = self.base.db().select((TABLE, coupon_id)).await?;
        Ok(coupon)
    }

    /// Look up a coupon by redemption code (case-insensitive)
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let normalized = code.trim().to_uppercase();
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query("SELECT * FROM coupon WHERE code = $code LIMIT 1")
            .bind(("code", normalized))
            .await?
            .take(0)?;
        Ok(coupons.into_iter().next())
    }

    pub async fn create(&self, data: CouponCreate) -> RepoResult<Coupon> {
        if data.expiration_date <= data.start_date {
            return Err(RepoError::Validation(
                "expiration_date must be after start_date".into(),
            ));
        }
        let code = data.code.trim().to_uppercase();
        if self.find_by_code(&code).await?.is_some() {
            return Err(RepoError::Duplicate(format!("Coupon code {}", code)));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let coupon = Coupon {
            coupon_id: uuid::Uuid::new_v4().to_string(),
            code,
            name: data.name,
            discount_type: data.discount_type,
            value: data.value,
            is_active: data.is_active,
            start_date: data.start_date,
            expiration_date: data.expiration_date,
            minimum_purchase: data.minimum_purchase,
            max_uses_per_user: data.max_uses_per_user,
            is_stackable: data.is_stackable,
            created_at: now,
            updated_at: now,
        };
        let created: Option<Coupon> = self
            .base
            .db()
            .create((TABLE, coupon.coupon_id.clone()))
            .content(coupon)
            .await?;
        created.ok_or_else(|| RepoError::Database("create returned no record".into()))
    }

    pub async fn delete(&self, coupon_id: &str) -> RepoResult<bool> {
        let deleted: Option<Coupon> = self.base.db().delete((TABLE, coupon_id)).await?;
        Ok(deleted.is_some())
    }
}
