//! Banner Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_BUTTON_TEXT: &str = "Shop Now";
pub const DEFAULT_BUTTON_LINK: &str = "/products";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub button_text: String,
    pub button_link: String,
    pub image: String,
    #[serde(default)]
    pub bg_color: String,
    pub is_active: bool,
    pub order: i32,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    /// Active and inside its date window; a missing bound is open.
    pub fn is_currently_active(&self, now: DateTime<Utc>) -> bool {
        let started = self.start_date.map_or(true, |s| s <= now);
        let not_ended = self.end_date.map_or(true, |e| e >= now);
        self.is_active && started && not_ended
    }

    pub fn toggle(&mut self) {
        self.is_active = !self.is_active;
        self.updated_at = Utc::now();
    }
}

/// Display order: `order` ascending, newest first within the same slot.
pub fn sort_for_display(banners: &mut [Banner]) {
    banners.sort_by(|a, b| a.order.cmp(&b.order).then(b.created_at.cmp(&a.created_at)));
}
