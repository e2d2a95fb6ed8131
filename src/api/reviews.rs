use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::{listing, AppState};
use crate::domain::value_objects::{Actor, PageRequest};
use crate::services::reviews::{CreateReviewRequest, DEFAULT_PAGE_SIZE};
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct ReviewListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<ReviewListParams>,
) -> Result<Json<Value>> {
    let page = PageRequest::new(params.page, params.limit, DEFAULT_PAGE_SIZE);
    let reviews = state.reviews.list_reviews(product_id, page).await?;
    Ok(listing("reviews", reviews))
}

pub async fn eligibility(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(product_id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let e = state.reviews.eligibility(&actor, product_id).await?;
    Ok(Json(json!({ "success": true, "canReview": e.can_review, "message": e.message })))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let review = state.reviews.create_review(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "review": review }))))
}

pub async fn helpful(State(state): State<AppState>, actor: Actor, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    let review = state.reviews.mark_helpful(&actor, id).await?;
    Ok(Json(json!({ "success": true, "review": review })))
}
