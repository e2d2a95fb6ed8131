//! Product reviews
//!
//! Only customers with a shipped or delivered order containing the product
//! may review it, once. Product ratings are recomputed from approved reviews
//! after every new review.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{OrderStatus, Ratings, Review};
use crate::domain::value_objects::{Actor, Page, PageRequest};
use crate::store::{OrderStore, ProductStore, ReviewStore, Store};
use crate::{EcommerceError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

const NOT_PURCHASED: &str = "Only customers who purchased this product can leave a review";
const ALREADY_REVIEWED: &str = "You have already reviewed this product";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub product: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub can_review: bool,
    pub message: String,
}

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn Store>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    pub async fn list_reviews(&self, product: Uuid, page: PageRequest) -> Result<Page<Review>> {
        Ok(self.store.list_reviews(product, page).await?)
    }

    pub async fn eligibility(&self, actor: &Actor, product: Uuid) -> Result<Eligibility> {
        if !self.has_purchased(actor.id, product).await? {
            return Ok(Eligibility { can_review: false, message: format!("{NOT_PURCHASED}.") });
        }
        if self.store.review_exists(product, actor.id).await? {
            return Ok(Eligibility { can_review: false, message: format!("{ALREADY_REVIEWED}.") });
        }
        Ok(Eligibility { can_review: true, message: String::new() })
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id, product_id = %request.product))]
    pub async fn create_review(&self, actor: &Actor, request: CreateReviewRequest) -> Result<Review> {
        request.validate()?;
        if self.store.review_exists(request.product, actor.id).await? {
            return Err(EcommerceError::validation(ALREADY_REVIEWED));
        }
        if !self.has_purchased(actor.id, request.product).await? {
            return Err(EcommerceError::Forbidden(NOT_PURCHASED.to_string()));
        }

        let review = Review::verified_purchase(
            request.product,
            actor.id,
            request.rating,
            request.title,
            request.comment,
            request.images,
        );
        self.store.insert_review(&review).await?;

        let ratings = Ratings::from_scores(&self.store.approved_ratings(request.product).await?);
        self.store.set_product_ratings(request.product, &ratings).await?;
        tracing::info!(review_id = %review.id, average = ratings.average, count = ratings.count, "review added");
        Ok(review)
    }

    pub async fn mark_helpful(&self, actor: &Actor, id: Uuid) -> Result<Review> {
        let mut review = self
            .store
            .get_review(id)
            .await?
            .ok_or_else(|| EcommerceError::NotFound("Review not found".to_string()))?;
        if !review.mark_helpful(actor.id) {
            return Err(EcommerceError::validation("You have already marked this review as helpful"));
        }
        self.store.save_review(&review).await?;
        Ok(review)
    }

    async fn has_purchased(&self, user: Uuid, product: Uuid) -> Result<bool> {
        Ok(self.store.has_purchased(user, product, &OrderStatus::FULFILLED).await?)
    }
}
