use axum::extract::State;
use axum::Json;
use serde_json::{json, Map, Value};

use super::extract::ApiJson;
use super::AppState;
use crate::domain::value_objects::Actor;
use crate::Result;

pub async fn public(State(state): State<AppState>) -> Result<Json<Value>> {
    let settings = state.settings.public_settings().await?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

pub async fn get(State(state): State<AppState>, actor: Actor) -> Result<Json<Value>> {
    let settings = state.settings.settings(&actor).await?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(patch): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>> {
    let settings = state.settings.update_settings(&actor, patch).await?;
    Ok(Json(json!({ "success": true, "message": "Settings updated", "settings": settings })))
}
