//! Review Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product: Uuid,
    pub user: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub verified: bool,
    pub is_approved: bool,
    #[serde(default)]
    pub helpful: Helpful,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Helpful {
    pub count: u32,
    pub users: Vec<Uuid>,
}

impl Review {
    /// Reviews are only accepted from verified purchasers, so new reviews are
    /// verified and approved from the start.
    pub fn verified_purchase(
        product: Uuid,
        user: Uuid,
        rating: u8,
        title: Option<String>,
        comment: Option<String>,
        images: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            product,
            user,
            rating,
            title,
            comment,
            images,
            verified: true,
            is_approved: true,
            helpful: Helpful::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `false` if `user` already marked this review.
    pub fn mark_helpful(&mut self, user: Uuid) -> bool {
        if self.helpful.users.contains(&user) {
            return false;
        }
        self.helpful.users.push(user);
        self.helpful.count += 1;
        self.updated_at = Utc::now();
        true
    }
}
