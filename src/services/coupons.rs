//! Discount coupons

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::coupon::normalize_code;
use crate::domain::aggregates::{is_coupon_valid, Coupon, DiscountType};
use crate::domain::value_objects::Actor;
use crate::services::non_negative;
use crate::store::{CouponStore, Store};
use crate::{EcommerceError, Result};

fn default_per_user_limit() -> u32 { 1 }
fn default_true() -> bool { true }

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, message = "Please provide coupon code"))]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[validate(custom = "non_negative")]
    pub discount_value: Decimal,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub min_purchase: Decimal,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub max_discount: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default = "default_per_user_limit")]
    pub per_user_limit: u32,
    #[serde(default)]
    pub applicable_products: Vec<Uuid>,
    #[serde(default)]
    pub applicable_categories: Vec<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidateCouponParams {
    pub code: String,
    #[serde(default)]
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponCheck {
    pub valid: bool,
    pub discount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
}

#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn Store>,
}

impl CouponService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    pub async fn create_coupon(&self, actor: &Actor, request: CreateCouponRequest) -> Result<Coupon> {
        actor.require_admin()?;
        request.validate()?;
        let code = normalize_code(&request.code);
        if code.is_empty() {
            return Err(EcommerceError::validation("Please provide coupon code"));
        }
        if request.end_date < request.start_date {
            return Err(EcommerceError::validation("End date must not be before start date"));
        }
        let now = Utc::now();
        let coupon = Coupon {
            id: Uuid::now_v7(),
            code,
            description: request.description,
            discount_type: request.discount_type,
            discount_value: request.discount_value,
            min_purchase: request.min_purchase,
            max_discount: request.max_discount,
            start_date: request.start_date,
            end_date: request.end_date,
            usage_limit: request.usage_limit,
            used_count: 0,
            per_user_limit: request.per_user_limit,
            applicable_products: request.applicable_products,
            applicable_categories: request.applicable_categories,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_coupon(&coupon).await?;
        tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "coupon created");
        Ok(coupon)
    }

    /// Whether `code` applies to a purchase of `amount` right now, and the
    /// discount it would give. Unknown codes are simply invalid.
    pub async fn check_coupon(&self, params: ValidateCouponParams) -> Result<CouponCheck> {
        let code = normalize_code(&params.code);
        let Some(coupon) = self.store.find_coupon_by_code(&code).await? else {
            return Ok(CouponCheck { valid: false, discount: Decimal::ZERO, coupon: None });
        };
        if !is_coupon_valid(&coupon, Utc::now(), params.amount) {
            return Ok(CouponCheck { valid: false, discount: Decimal::ZERO, coupon: None });
        }
        Ok(CouponCheck { valid: true, discount: coupon.discount_for(params.amount), coupon: Some(coupon) })
    }
}
