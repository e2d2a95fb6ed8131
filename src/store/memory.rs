//! In-memory store.
//!
//! Enforces the same unique indexes as the database schema (non-empty product
//! slug, order number, coupon code) so conflict handling behaves identically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BannerStore, CouponStore, OrderQuery, OrderStore, ProductQuery, ProductStore, ReviewStore, SettingsStore,
    Store, StoreError, StoreResult,
};
use crate::domain::aggregates::banner::sort_for_display;
use crate::domain::aggregates::{
    Banner, Coupon, Order, OrderStatus, Product, ProductPatch, Ratings, Review, Settings,
};
use crate::domain::value_objects::{Page, PageRequest};

#[derive(Default)]
struct Collections {
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
    coupons: HashMap<Uuid, Coupon>,
    reviews: HashMap<Uuid, Review>,
    banners: HashMap<Uuid, Banner>,
    settings: Option<Settings>,
}

/// Thread-safe in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Make `ping` fail, simulating a lost database connection.
    pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }
}

fn non_empty_slug(p: &Product) -> Option<&str> {
    p.slug.as_ref().map(|s| s.as_str()).filter(|s| !s.is_empty())
}

fn slug_taken(products: &HashMap<Uuid, Product>, candidate: &Product) -> bool {
    let Some(slug) = non_empty_slug(candidate) else { return false };
    products
        .values()
        .any(|p| p.id != candidate.id && non_empty_slug(p) == Some(slug))
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.products.contains_key(&product.id) {
            return Err(StoreError::Conflict("product".into()));
        }
        if slug_taken(&db.products, product) {
            return Err(StoreError::Conflict("slug".into()));
        }
        db.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product_fields(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>> {
        let mut db = self.inner.write().await;
        let Some(mut updated) = db.products.get(&id).cloned() else { return Ok(None) };
        patch.apply_to(&mut updated, Utc::now());
        if slug_taken(&db.products, &updated) {
            return Err(StoreError::Conflict("slug".into()));
        }
        db.products.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn save_product_counters(&self, product: &Product) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if let Some(stored) = db.products.get_mut(&product.id) {
            stored.sales = product.sales;
            stored.inventory.stock = product.inventory.stock;
            stored.updated_at = product.updated_at;
        }
        Ok(())
    }

    async fn set_product_ratings(&self, id: Uuid, ratings: &Ratings) -> StoreResult<()> {
        if let Some(stored) = self.inner.write().await.products.get_mut(&id) {
            stored.ratings = ratings.clone();
        }
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.products.remove(&id).is_some())
    }

    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> StoreResult<Page<Product>> {
        let db = self.inner.read().await;
        let mut matching: Vec<Product> = db.products.values().filter(|p| query.matches(p)).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::from_sorted(matching, page))
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        let db = self.inner.read().await;
        Ok(db
            .products
            .values()
            .any(|p| Some(p.id) != exclude && non_empty_slug(p) == Some(slug)))
    }

    async fn slugs_with_base(&self, base: &str, exclude: Option<Uuid>) -> StoreResult<Vec<String>> {
        let prefix = format!("{base}-");
        let db = self.inner.read().await;
        Ok(db
            .products
            .values()
            .filter(|p| Some(p.id) != exclude)
            .filter_map(non_empty_slug)
            .filter(|s| *s == base || s.starts_with(&prefix))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.orders.values().any(|o| o.order_number == order.order_number) {
            return Err(StoreError::Conflict("order number".into()));
        }
        db.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn save_order(&self, order: &Order) -> StoreResult<()> {
        self.inner.write().await.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn list_orders(&self, query: &OrderQuery, page: PageRequest) -> StoreResult<Page<Order>> {
        let db = self.inner.read().await;
        let mut matching: Vec<Order> = db
            .orders
            .values()
            .filter(|o| query.user.map_or(true, |u| o.user == u))
            .filter(|o| query.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::from_sorted(matching, page))
    }

    async fn has_purchased(&self, user: Uuid, product: Uuid, statuses: &[OrderStatus]) -> StoreResult<bool> {
        let db = self.inner.read().await;
        Ok(db
            .orders
            .values()
            .any(|o| o.user == user && statuses.contains(&o.status) && o.contains_product(product)))
    }
}

#[async_trait]
impl CouponStore for MemoryStore {
    async fn find_coupon_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        Ok(self.inner.read().await.coupons.values().find(|c| c.code == code).cloned())
    }

    async fn insert_coupon(&self, coupon: &Coupon) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.coupons.values().any(|c| c.code == coupon.code) {
            return Err(StoreError::Conflict("coupon code".into()));
        }
        db.coupons.insert(coupon.id, coupon.clone());
        Ok(())
    }

    async fn increment_coupon_usage(&self, id: Uuid) -> StoreResult<()> {
        if let Some(c) = self.inner.write().await.coupons.get_mut(&id) {
            c.used_count += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.inner.read().await.reviews.get(&id).cloned())
    }

    async fn review_exists(&self, product: Uuid, user: Uuid) -> StoreResult<bool> {
        let db = self.inner.read().await;
        Ok(db.reviews.values().any(|r| r.product == product && r.user == user))
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        self.inner.write().await.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn save_review(&self, review: &Review) -> StoreResult<()> {
        self.inner.write().await.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn list_reviews(&self, product: Uuid, page: PageRequest) -> StoreResult<Page<Review>> {
        let db = self.inner.read().await;
        let mut matching: Vec<Review> = db
            .reviews
            .values()
            .filter(|r| r.product == product && r.is_approved)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::from_sorted(matching, page))
    }

    async fn approved_ratings(&self, product: Uuid) -> StoreResult<Vec<u8>> {
        let db = self.inner.read().await;
        Ok(db
            .reviews
            .values()
            .filter(|r| r.product == product && r.is_approved)
            .map(|r| r.rating)
            .collect())
    }
}

#[async_trait]
impl BannerStore for MemoryStore {
    async fn list_banners(&self, active_at: Option<DateTime<Utc>>) -> StoreResult<Vec<Banner>> {
        let db = self.inner.read().await;
        let mut banners: Vec<Banner> = db
            .banners
            .values()
            .filter(|b| active_at.map_or(true, |now| b.is_currently_active(now)))
            .cloned()
            .collect();
        sort_for_display(&mut banners);
        Ok(banners)
    }

    async fn get_banner(&self, id: Uuid) -> StoreResult<Option<Banner>> {
        Ok(self.inner.read().await.banners.get(&id).cloned())
    }

    async fn insert_banner(&self, banner: &Banner) -> StoreResult<()> {
        self.inner.write().await.banners.insert(banner.id, banner.clone());
        Ok(())
    }

    async fn save_banner(&self, banner: &Banner) -> StoreResult<()> {
        self.inner.write().await.banners.insert(banner.id, banner.clone());
        Ok(())
    }

    async fn delete_banner(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.banners.remove(&id).is_some())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load_settings(&self) -> StoreResult<Option<Settings>> {
        Ok(self.inner.read().await.settings.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.inner.write().await.settings = Some(settings.clone());
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory store offline".into()));
        }
        Ok(())
    }
}
