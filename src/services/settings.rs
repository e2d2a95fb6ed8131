//! Site settings
//!
//! A single document, created with defaults the first time anyone reads it.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::aggregates::{PublicSettings, Settings};
use crate::domain::value_objects::Actor;
use crate::store::{SettingsStore, Store};
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn Store>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    async fn get_or_create(&self) -> Result<Settings> {
        if let Some(settings) = self.store.load_settings().await? {
            return Ok(settings);
        }
        let settings = Settings::default();
        self.store.save_settings(&settings).await?;
        tracing::info!("settings document created with defaults");
        Ok(settings)
    }

    pub async fn public_settings(&self) -> Result<PublicSettings> {
        Ok(self.get_or_create().await?.public_view())
    }

    pub async fn settings(&self, actor: &Actor) -> Result<Settings> {
        actor.require_admin()?;
        self.get_or_create().await
    }

    /// Replace each top-level key present in `patch`.
    pub async fn update_settings(&self, actor: &Actor, patch: Map<String, Value>) -> Result<Settings> {
        actor.require_admin()?;
        let current = self.get_or_create().await?;
        let merged = current.merged(patch, actor.id).map_err(|e| EcommerceError::Validation {
            message: "Failed to update settings".to_string(),
            details: Some(Value::String(e.to_string())),
        })?;
        self.store.save_settings(&merged).await?;
        tracing::info!(updated_by = %actor.id, "settings updated");
        Ok(merged)
    }
}
