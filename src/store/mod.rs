//! Persistence
//!
//! Each aggregate has its own store trait; [`Store`] is the union the
//! services hold as `Arc<dyn Store>`. Writes are single-document: nothing in
//! this module spans documents atomically.
//!
//! Implementations:
//! - [`MemoryStore`] - in-process maps, used for development and tests
//! - [`PgStore`] - `PostgreSQL`, one JSONB document per row

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{
    Banner, Coupon, Order, OrderStatus, Product, ProductPatch, Ratings, Review, Settings,
};
use crate::domain::value_objects::{Page, PageRequest};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("{0} already exists")]
    Conflict(String),

    #[error("database error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                let what = match db.constraint() {
                    Some("unique_slug_nonempty") => "slug",
                    Some("orders_order_number_key") => "order number",
                    Some("coupons_code_key") => "coupon code",
                    _ => "record",
                };
                return Self::Conflict(what.to_string());
            }
        }
        Self::Backend(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone, Debug, Default)]
pub struct ProductQuery {
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: bool,
}

impl ProductQuery {
    /// Filter semantics shared by every implementation. Only active products match.
    pub fn matches(&self, p: &Product) -> bool {
        p.is_active
            && self.category.map_or(true, |c| p.category == c)
            && self.featured.map_or(true, |f| p.featured == f)
            && self.search.as_deref().map_or(true, |s| p.matches_search(s))
            && self.min_price.map_or(true, |min| p.price >= min)
            && self.max_price.map_or(true, |max| p.price <= max)
            && (!self.in_stock || p.inventory.stock > 0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderQuery {
    pub user: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    /// Fails with `Conflict` when another product holds the same non-empty slug.
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    /// Write only the fields present in `patch` and return the stored
    /// product, or `None` if it does not exist. Never creates a product.
    /// Fails with `Conflict` like `insert_product`.
    async fn update_product_fields(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>>;
    /// Writes only `sales` and `inventory.stock`.
    async fn save_product_counters(&self, product: &Product) -> StoreResult<()>;
    async fn set_product_ratings(&self, id: Uuid, ratings: &Ratings) -> StoreResult<()>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> StoreResult<Page<Product>>;
    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool>;
    /// Slugs equal to `base` or of the form `base-<anything>`.
    async fn slugs_with_base(&self, base: &str, exclude: Option<Uuid>) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    /// Fails with `Conflict` on a duplicate order number.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    async fn save_order(&self, order: &Order) -> StoreResult<()>;
    async fn list_orders(&self, query: &OrderQuery, page: PageRequest) -> StoreResult<Page<Order>>;
    async fn has_purchased(&self, user: Uuid, product: Uuid, statuses: &[OrderStatus]) -> StoreResult<bool>;
}

#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_coupon_by_code(&self, code: &str) -> StoreResult<Option<Coupon>>;
    async fn insert_coupon(&self, coupon: &Coupon) -> StoreResult<()>;
    async fn increment_coupon_usage(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>>;
    async fn review_exists(&self, product: Uuid, user: Uuid) -> StoreResult<bool>;
    async fn insert_review(&self, review: &Review) -> StoreResult<()>;
    async fn save_review(&self, review: &Review) -> StoreResult<()>;
    /// Approved reviews for a product, newest first.
    async fn list_reviews(&self, product: Uuid, page: PageRequest) -> StoreResult<Page<Review>>;
    async fn approved_ratings(&self, product: Uuid) -> StoreResult<Vec<u8>>;
}

#[async_trait]
pub trait BannerStore: Send + Sync {
    /// All banners when `active_at` is `None`, otherwise those live at that instant.
    /// Sorted by `order` ascending, then newest first.
    async fn list_banners(&self, active_at: Option<DateTime<Utc>>) -> StoreResult<Vec<Banner>>;
    async fn get_banner(&self, id: Uuid) -> StoreResult<Option<Banner>>;
    async fn insert_banner(&self, banner: &Banner) -> StoreResult<()>;
    async fn save_banner(&self, banner: &Banner) -> StoreResult<()>;
    async fn delete_banner(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load_settings(&self) -> StoreResult<Option<Settings>>;
    async fn save_settings(&self, settings: &Settings) -> StoreResult<()>;
}

#[async_trait]
pub trait Store:
    ProductStore + OrderStore + CouponStore + ReviewStore + BannerStore + SettingsStore
{
    /// Liveness check for the backing database.
    async fn ping(&self) -> StoreResult<()>;
}
