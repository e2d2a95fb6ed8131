use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::{listing, AppState};
use crate::domain::aggregates::{OrderStatus, Tracking};
use crate::domain::value_objects::{Actor, PageRequest};
use crate::services::orders::{CancelRequest, CreateOrderRequest, StatusChangeRequest, DEFAULT_PAGE_SIZE};
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    ApiQuery(params): ApiQuery<OrderListParams>,
) -> Result<Json<Value>> {
    let page = PageRequest::new(params.page, params.limit, DEFAULT_PAGE_SIZE);
    let orders = state.orders.list_orders(&actor, params.status, page).await?;
    Ok(listing("orders", orders))
}

pub async fn get(State(state): State<AppState>, actor: Actor, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    let order = state.orders.get_order(&actor, id).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let order = state.orders.create_order(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "order": order }))))
}

pub async fn set_status(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<StatusChangeRequest>,
) -> Result<Json<Value>> {
    let order = state.orders.set_order_status(&actor, id, request.status, request.note).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

pub async fn cancel(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    request: Option<ApiJson<CancelRequest>>,
) -> Result<Json<Value>> {
    let note = request.and_then(|ApiJson(r)| r.note);
    let order = state.orders.cancel_own_order(&actor, id, note).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

pub async fn update_tracking(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(tracking): ApiJson<Tracking>,
) -> Result<Json<Value>> {
    let order = state.orders.update_tracking(&actor, id, tracking).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}
