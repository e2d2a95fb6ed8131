use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use super::AppState;
use crate::domain::value_objects::Actor;
use crate::services::banners::{BannerUpdate, CreateBannerRequest};
use crate::Result;

pub async fn active(State(state): State<AppState>) -> Result<Json<Value>> {
    let banners = state.banners.active_banners().await?;
    Ok(Json(json!({ "success": true, "count": banners.len(), "banners": banners })))
}

pub async fn all(State(state): State<AppState>, actor: Actor) -> Result<Json<Value>> {
    let banners = state.banners.all_banners(&actor).await?;
    Ok(Json(json!({ "success": true, "count": banners.len(), "banners": banners })))
}

pub async fn get(State(state): State<AppState>, actor: Actor, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    let banner = state.banners.get_banner(&actor, id).await?;
    Ok(Json(json!({ "success": true, "banner": banner })))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(request): ApiJson<CreateBannerRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let banner = state.banners.create_banner(&actor, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Banner created successfully", "banner": banner })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<BannerUpdate>,
) -> Result<Json<Value>> {
    let banner = state.banners.update_banner(&actor, id, update).await?;
    Ok(Json(json!({ "success": true, "message": "Banner updated successfully", "banner": banner })))
}

pub async fn delete(State(state): State<AppState>, actor: Actor, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    state.banners.delete_banner(&actor, id).await?;
    Ok(Json(json!({ "success": true, "message": "Banner deleted successfully" })))
}

pub async fn toggle(State(state): State<AppState>, actor: Actor, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    let banner = state.banners.toggle_banner(&actor, id).await?;
    let verb = if banner.is_active { "activated" } else { "deactivated" };
    Ok(Json(json!({ "success": true, "message": format!("Banner {verb} successfully"), "banner": banner })))
}
