//! `PostgreSQL` store.
//!
//! Every aggregate is stored whole in a JSONB `doc` column. The columns next
//! to it are projections used for filtering, ordering and unique indexes.
//! Product writes after the insert are field-level, so counters updated by
//! orders are never overwritten with stale values. See `migrations/` for the schema.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    BannerStore, CouponStore, OrderQuery, OrderStore, ProductQuery, ProductStore, ReviewStore, SettingsStore,
    Store, StoreError, StoreResult,
};
use crate::domain::aggregates::{
    Banner, Coupon, Order, OrderStatus, Product, ProductPatch, Ratings, Review, Settings,
};
use crate::domain::value_objects::{Page, PageRequest};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a pool and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the connection or a migration fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }
}

fn page_of<T>(items: Vec<Json<T>>, total: i64, page: PageRequest) -> Page<T> {
    Page {
        items: items.into_iter().map(|Json(item)| item).collect(),
        total: total.max(0).unsigned_abs(),
        page: page.page,
        limit: page.limit,
    }
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    qb.push(" WHERE is_active");
    if let Some(category) = query.category {
        qb.push(" AND category_id = ").push_bind(category);
    }
    if let Some(featured) = query.featured {
        qb.push(" AND featured = ").push_bind(featured);
    }
    if let Some(search) = query.search.as_deref() {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ").push_bind(pattern.clone());
        qb.push(" OR doc->>'description' ILIKE ").push_bind(pattern.clone());
        qb.push(" OR EXISTS (SELECT 1 FROM jsonb_array_elements_text(doc->'tags') tag WHERE tag ILIKE ")
            .push_bind(pattern);
        qb.push("))");
    }
    if let Some(min) = query.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if query.in_stock {
        qb.push(" AND stock > 0");
    }
}

/// Column projections fall back to their current value when the patch leaves
/// them out. Top-level doc keys are merged with `||`; inventory keys are merged
/// into the nested object so `sales`, `ratings` and an unpatched `stock` keep
/// whatever concurrent writers stored.
const PATCH_PRODUCT: &str = "UPDATE products SET \
     name = COALESCE($2, name), \
     slug = CASE WHEN $3 THEN $4 ELSE slug END, \
     price = COALESCE($5, price), \
     category_id = COALESCE($6, category_id), \
     featured = COALESCE($7, featured), \
     is_active = COALESCE($8, is_active), \
     stock = COALESCE($9, stock), \
     doc = jsonb_set(doc || $10, '{inventory}', COALESCE(doc->'inventory', '{}'::jsonb) || $11) \
     WHERE id = $1 RETURNING doc";

#[async_trait]
impl ProductStore for PgStore {
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let row: Option<Json<Product>> = sqlx::query_scalar("SELECT doc FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(p)| p))
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO products (id, slug, name, price, category_id, featured, is_active, stock, created_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(product.id)
        .bind(product.slug.as_ref().map(|s| s.as_str()))
        .bind(&product.name)
        .bind(product.price)
        .bind(product.category)
        .bind(product.featured)
        .bind(product.is_active)
        .bind(i64::from(product.inventory.stock))
        .bind(product.created_at)
        .bind(Json(product))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_product_fields(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>> {
        let mut doc = match serde_json::to_value(patch)? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        doc.insert("updatedAt".into(), serde_json::to_value(Utc::now())?);
        let inventory = serde_json::to_value(patch.inventory.clone().unwrap_or_default())?;

        let row: Option<Json<Product>> = sqlx::query_scalar(PATCH_PRODUCT)
            .bind(id)
            .bind(patch.name.as_deref())
            .bind(patch.slug.is_some())
            .bind(patch.slug.as_ref().and_then(|s| s.as_ref().map(|s| s.as_str())))
            .bind(patch.price)
            .bind(patch.category)
            .bind(patch.featured)
            .bind(patch.is_active)
            .bind(patch.inventory.as_ref().and_then(|i| i.stock).map(i64::from))
            .bind(Json(doc))
            .bind(Json(inventory))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(p)| p))
    }

    async fn save_product_counters(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            "UPDATE products SET stock = $2, \
             doc = jsonb_set(jsonb_set(jsonb_set(doc, '{sales}', to_jsonb($3::bigint)), \
                   '{inventory,stock}', to_jsonb($2::bigint)), '{updatedAt}', to_jsonb($4::timestamptz)) \
             WHERE id = $1",
        )
        .bind(product.id)
        .bind(i64::from(product.inventory.stock))
        .bind(i64::from(product.sales))
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_product_ratings(&self, id: Uuid, ratings: &Ratings) -> StoreResult<()> {
        sqlx::query("UPDATE products SET doc = jsonb_set(doc, '{ratings}', $2) WHERE id = $1")
            .bind(id)
            .bind(Json(ratings))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> StoreResult<Page<Product>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_product_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT doc FROM products");
        push_product_filters(&mut select, query);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let items = select.build_query_scalar::<Json<Product>>().fetch_all(&self.pool).await?;
        Ok(page_of(items, total, page))
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn slugs_with_base(&self, base: &str, exclude: Option<Uuid>) -> StoreResult<Vec<String>> {
        // Slugs are `[a-z0-9-]` only, so `base` carries no LIKE wildcards.
        let slugs: Vec<String> = sqlx::query_scalar(
            "SELECT slug FROM products \
             WHERE slug IS NOT NULL AND (slug = $1 OR slug LIKE $2) AND ($3::uuid IS NULL OR id <> $3)",
        )
        .bind(base)
        .bind(format!("{base}-%"))
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row: Option<Json<Order>> = sqlx::query_scalar("SELECT doc FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(o)| o))
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO orders (id, order_number, user_id, status, created_at, doc) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id)
        .bind(order.order_number.as_str())
        .bind(order.user)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(Json(order))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_order(&self, order: &Order) -> StoreResult<()> {
        sqlx::query("UPDATE orders SET status = $2, doc = $3 WHERE id = $1")
            .bind(order.id)
            .bind(order.status.as_str())
            .bind(Json(order))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_orders(&self, query: &OrderQuery, page: PageRequest) -> StoreResult<Page<Order>> {
        let status = query.status.map(|s| s.as_str());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ($1::uuid IS NULL OR user_id = $1) AND ($2::text IS NULL OR status = $2)",
        )
        .bind(query.user)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        let items: Vec<Json<Order>> = sqlx::query_scalar(
            "SELECT doc FROM orders WHERE ($1::uuid IS NULL OR user_id = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(query.user)
        .bind(status)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(page_of(items, total, page))
    }

    async fn has_purchased(&self, user: Uuid, product: Uuid, statuses: &[OrderStatus]) -> StoreResult<bool> {
        let statuses: Vec<&str> = statuses.iter().map(OrderStatus::as_str).collect();
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE user_id = $1 AND status = ANY($2) AND doc->'items' @> $3)",
        )
        .bind(user)
        .bind(statuses)
        .bind(Json(json!([{ "product": product }])))
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl CouponStore for PgStore {
    async fn find_coupon_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        let row: Option<Json<Coupon>> = sqlx::query_scalar("SELECT doc FROM coupons WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(c)| c))
    }

    async fn insert_coupon(&self, coupon: &Coupon) -> StoreResult<()> {
        sqlx::query("INSERT INTO coupons (id, code, doc) VALUES ($1, $2, $3)")
            .bind(coupon.id)
            .bind(&coupon.code)
            .bind(Json(coupon))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_coupon_usage(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "UPDATE coupons SET doc = jsonb_set(doc, '{usedCount}', \
             to_jsonb(COALESCE((doc->>'usedCount')::bigint, 0) + 1)) WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let row: Option<Json<Review>> = sqlx::query_scalar("SELECT doc FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(r)| r))
    }

    async fn review_exists(&self, product: Uuid, user: Uuid) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reviews WHERE product_id = $1 AND user_id = $2)")
                .bind(product)
                .bind(user)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO reviews (id, product_id, user_id, rating, is_approved, created_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(review.id)
        .bind(review.product)
        .bind(review.user)
        .bind(i16::from(review.rating))
        .bind(review.is_approved)
        .bind(review.created_at)
        .bind(Json(review))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_review(&self, review: &Review) -> StoreResult<()> {
        sqlx::query("UPDATE reviews SET rating = $2, is_approved = $3, doc = $4 WHERE id = $1")
            .bind(review.id)
            .bind(i16::from(review.rating))
            .bind(review.is_approved)
            .bind(Json(review))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_reviews(&self, product: Uuid, page: PageRequest) -> StoreResult<Page<Review>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE product_id = $1 AND is_approved")
            .bind(product)
            .fetch_one(&self.pool)
            .await?;
        let items: Vec<Json<Review>> = sqlx::query_scalar(
            "SELECT doc FROM reviews WHERE product_id = $1 AND is_approved ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(product)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(page_of(items, total, page))
    }

    async fn approved_ratings(&self, product: Uuid) -> StoreResult<Vec<u8>> {
        let ratings: Vec<i16> = sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = $1 AND is_approved")
            .bind(product)
            .fetch_all(&self.pool)
            .await?;
        Ok(ratings.into_iter().filter_map(|r| u8::try_from(r).ok()).collect())
    }
}

impl PgStore {
    async fn write_banner(&self, banner: &Banner) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO banners (id, sort_order, is_active, start_date, end_date, created_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET sort_order = EXCLUDED.sort_order, is_active = EXCLUDED.is_active, \
             start_date = EXCLUDED.start_date, end_date = EXCLUDED.end_date, doc = EXCLUDED.doc",
        )
        .bind(banner.id)
        .bind(banner.order)
        .bind(banner.is_active)
        .bind(banner.start_date)
        .bind(banner.end_date)
        .bind(banner.created_at)
        .bind(Json(banner))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BannerStore for PgStore {
    async fn list_banners(&self, active_at: Option<DateTime<Utc>>) -> StoreResult<Vec<Banner>> {
        let rows: Vec<Json<Banner>> = sqlx::query_scalar(
            "SELECT doc FROM banners WHERE $1::timestamptz IS NULL OR (is_active \
             AND (start_date IS NULL OR start_date <= $1) AND (end_date IS NULL OR end_date >= $1)) \
             ORDER BY sort_order ASC, created_at DESC",
        )
        .bind(active_at)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(b)| b).collect())
    }

    async fn get_banner(&self, id: Uuid) -> StoreResult<Option<Banner>> {
        let row: Option<Json<Banner>> = sqlx::query_scalar("SELECT doc FROM banners WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(b)| b))
    }

    async fn insert_banner(&self, banner: &Banner) -> StoreResult<()> {
        self.write_banner(banner).await
    }

    async fn save_banner(&self, banner: &Banner) -> StoreResult<()> {
        self.write_banner(banner).await
    }

    async fn delete_banner(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM banners WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn load_settings(&self) -> StoreResult<Option<Settings>> {
        let row: Option<Json<Settings>> = sqlx::query_scalar("SELECT doc FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(s)| s))
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        sqlx::query("INSERT INTO settings (id, doc) VALUES (1, $1) ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc")
            .bind(Json(settings))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
