use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::extract::{ApiJson, ApiQuery};
use super::AppState;
use crate::domain::value_objects::Actor;
use crate::services::coupons::{CreateCouponRequest, ValidateCouponParams};
use crate::Result;

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(request): ApiJson<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let coupon = state.coupons.create_coupon(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "coupon": coupon }))))
}

pub async fn validate(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ValidateCouponParams>,
) -> Result<Json<Value>> {
    let check = state.coupons.check_coupon(params).await?;
    Ok(Json(json!({ "success": true, "valid": check.valid, "discount": check.discount, "coupon": check.coupon })))
}
