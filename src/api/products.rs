use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::{listing, AppState};
use crate::domain::value_objects::Actor;
use crate::services::products::{CreateProductRequest, ProductListParams, ProductUpdate};
use crate::Result;

pub async fn list(State(state): State<AppState>, ApiQuery(params): ApiQuery<ProductListParams>) -> Result<Json<Value>> {
    let products = state.products.list_products(params).await?;
    Ok(listing("products", products))
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    let product = state.products.get_product(id).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let product = state.products.create_product(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "product": product }))))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Value>> {
    let product = state.products.update_product(&actor, id, update).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

pub async fn toggle_featured(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let product = state.products.toggle_featured(&actor, id).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

pub async fn delete(State(state): State<AppState>, actor: Actor, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    state.products.delete_product(&actor, id).await?;
    Ok(Json(json!({ "success": true, "message": "Product deleted successfully" })))
}
