//! Promotional banners

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::banner::{DEFAULT_BUTTON_LINK, DEFAULT_BUTTON_TEXT};
use crate::domain::aggregates::Banner;
use crate::domain::value_objects::Actor;
use crate::store::{BannerStore, Store};
use crate::{EcommerceError, Result};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBannerRequest {
    #[validate(length(max = 100, message = "Title cannot be more than 100 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 100, message = "Subtitle cannot be more than 100 characters"))]
    pub subtitle: Option<String>,
    #[validate(length(max = 200, message = "Description cannot be more than 200 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "Button text cannot be more than 50 characters"))]
    pub button_text: Option<String>,
    pub button_link: Option<String>,
    #[validate(length(min = 1, message = "Please provide a banner image URL"))]
    pub image: String,
    pub bg_color: Option<String>,
    pub is_active: Option<bool>,
    pub order: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update; absent fields are kept.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BannerUpdate {
    #[validate(length(max = 100, message = "Title cannot be more than 100 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 100, message = "Subtitle cannot be more than 100 characters"))]
    pub subtitle: Option<String>,
    #[validate(length(max = 200, message = "Description cannot be more than 200 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "Button text cannot be more than 50 characters"))]
    pub button_text: Option<String>,
    pub button_link: Option<String>,
    #[validate(length(min = 1, message = "Please provide a banner image URL"))]
    pub image: Option<String>,
    pub bg_color: Option<String>,
    pub is_active: Option<bool>,
    pub order: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct BannerService {
    store: Arc<dyn Store>,
}

impl BannerService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    /// Banners live right now, in display order.
    pub async fn active_banners(&self) -> Result<Vec<Banner>> {
        Ok(self.store.list_banners(Some(Utc::now())).await?)
    }

    pub async fn all_banners(&self, actor: &Actor) -> Result<Vec<Banner>> {
        actor.require_admin()?;
        Ok(self.store.list_banners(None).await?)
    }

    pub async fn get_banner(&self, actor: &Actor, id: Uuid) -> Result<Banner> {
        actor.require_admin()?;
        self.load(id).await
    }

    pub async fn create_banner(&self, actor: &Actor, request: CreateBannerRequest) -> Result<Banner> {
        actor.require_admin()?;
        request.validate()?;
        let now = Utc::now();
        let banner = Banner {
            id: Uuid::now_v7(),
            title: request.title,
            subtitle: request.subtitle,
            description: request.description,
            button_text: request.button_text.unwrap_or_else(|| DEFAULT_BUTTON_TEXT.to_string()),
            button_link: request.button_link.unwrap_or_else(|| DEFAULT_BUTTON_LINK.to_string()),
            image: request.image,
            bg_color: request.bg_color.unwrap_or_default(),
            is_active: request.is_active.unwrap_or(true),
            order: request.order.unwrap_or(0),
            start_date: Some(request.start_date.unwrap_or(now)),
            end_date: request.end_date,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_banner(&banner).await?;
        tracing::info!(banner_id = %banner.id, "banner created");
        Ok(banner)
    }

    pub async fn update_banner(&self, actor: &Actor, id: Uuid, update: BannerUpdate) -> Result<Banner> {
        actor.require_admin()?;
        update.validate()?;
        let mut b = self.load(id).await?;
        if let Some(v) = update.title { b.title = Some(v); }
        if let Some(v) = update.subtitle { b.subtitle = Some(v); }
        if let Some(v) = update.description { b.description = Some(v); }
        if let Some(v) = update.button_text { b.button_text = v; }
        if let Some(v) = update.button_link { b.button_link = v; }
        if let Some(v) = update.image { b.image = v; }
        if let Some(v) = update.bg_color { b.bg_color = v; }
        if let Some(v) = update.is_active { b.is_active = v; }
        if let Some(v) = update.order { b.order = v; }
        if let Some(v) = update.start_date { b.start_date = Some(v); }
        if let Some(v) = update.end_date { b.end_date = Some(v); }
        b.updated_at = Utc::now();
        self.store.save_banner(&b).await?;
        Ok(b)
    }

    pub async fn delete_banner(&self, actor: &Actor, id: Uuid) -> Result<()> {
        actor.require_admin()?;
        if !self.store.delete_banner(id).await? {
            return Err(not_found());
        }
        Ok(())
    }

    pub async fn toggle_banner(&self, actor: &Actor, id: Uuid) -> Result<Banner> {
        actor.require_admin()?;
        let mut banner = self.load(id).await?;
        banner.toggle();
        self.store.save_banner(&banner).await?;
        tracing::info!(banner_id = %banner.id, active = banner.is_active, "banner toggled");
        Ok(banner)
    }

    async fn load(&self, id: Uuid) -> Result<Banner> {
        self.store.get_banner(id).await?.ok_or_else(not_found)
    }
}

fn not_found() -> EcommerceError { EcommerceError::NotFound("Banner not found".to_string()) }
