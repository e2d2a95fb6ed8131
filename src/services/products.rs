//! Catalog operations
//!
//! Writes that touch `name` or `slug` allocate the slug and retry if a
//! concurrent writer claims it first. Updates are field-level: only what the
//! request carries is written, so stock and sales moved by orders in the
//! meantime are kept.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::product::{ProductImage, SeoData, ShippingInfo, VariantOption};
use crate::domain::aggregates::{Currency, Inventory, InventoryPatch, Product, ProductPatch, ProductView, Ratings};
use crate::domain::events::{DomainEvent, EventPublisher, ProductEvent};
use crate::domain::slug::{insert_with_unique_slug, update_with_unique_slug};
use crate::domain::value_objects::{Actor, Page, PageRequest};
use crate::services::{non_negative, not_blank};
use crate::store::{ProductQuery, ProductStore, Store};
use crate::{EcommerceError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 12;

fn default_true() -> bool { true }

/// Keeps an explicit `null` (`Some(None)`) apart from a missing field (`None`).
fn double_option<'de, T, D>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(custom(function = "not_blank", message = "Please provide product name"))]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[validate(custom(function = "not_blank", message = "Please provide product description"))]
    pub description: String,
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub compare_price: Option<Decimal>,
    #[serde(default)]
    pub currency: Currency,
    pub category: Uuid,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub variants: Vec<VariantOption>,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub seo: SeoData,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update. Absent fields are left alone.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[validate(custom(function = "not_blank", message = "Please provide product name"))]
    pub name: Option<String>,
    /// `Some(None)` or an empty string clears the slug.
    #[serde(default, deserialize_with = "double_option")]
    pub slug: Option<Option<String>>,
    #[validate(custom(function = "not_blank", message = "Please provide product description"))]
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub compare_price: Option<Option<Decimal>>,
    pub currency: Option<Currency>,
    pub category: Option<Uuid>,
    pub subcategory: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<ProductImage>>,
    pub variants: Option<Vec<VariantOption>>,
    /// Merged key by key; `stock` is written only when given.
    pub inventory: Option<InventoryPatch>,
    pub shipping: Option<ShippingInfo>,
    pub seo: Option<SeoData>,
    pub featured: Option<bool>,
    pub is_active: Option<bool>,
}

/// What an update does to the stored slug.
#[derive(Debug, PartialEq, Eq)]
pub enum SlugChange {
    Untouched,
    Clear,
    Allocate(String),
}

impl ProductUpdate {
    pub fn slug_change(&self) -> SlugChange {
        match &self.slug {
            Some(Some(raw)) if !raw.trim().is_empty() => SlugChange::Allocate(raw.trim().to_string()),
            Some(_) => SlugChange::Clear,
            None => match &self.name {
                Some(name) => SlugChange::Allocate(name.clone()),
                None => SlugChange::Untouched,
            },
        }
    }

    /// The field-level write for everything but the slug, which the caller
    /// resolves from [`slug_change`](Self::slug_change).
    fn into_patch(self) -> ProductPatch {
        ProductPatch {
            name: self.name.map(|n| n.trim().to_string()),
            slug: None,
            description: self.description,
            price: self.price,
            compare_price: self.compare_price,
            currency: self.currency,
            category: self.category,
            subcategory: self.subcategory,
            tags: self.tags,
            images: self.images,
            variants: self.variants,
            inventory: self.inventory,
            shipping: self.shipping,
            seo: self.seo,
            featured: self.featured,
            is_active: self.is_active,
        }
    }
}

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn Store>,
    events: EventPublisher,
}

impl ProductService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    pub async fn list_products(&self, params: ProductListParams) -> Result<Page<ProductView>> {
        let query = ProductQuery {
            category: params.category,
            featured: params.featured,
            search: params.search.filter(|s| !s.trim().is_empty()),
            min_price: params.min_price,
            max_price: params.max_price,
            in_stock: params.in_stock.unwrap_or(false),
        };
        let page = self
            .store
            .list_products(&query, PageRequest::new(params.page, params.limit, DEFAULT_PAGE_SIZE))
            .await?;
        Ok(Page {
            items: page.items.into_iter().map(ProductView::from).collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
        })
    }

    pub async fn get_product(&self, id: Uuid) -> Result<ProductView> {
        Ok(self.load(id).await?.into())
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id, name = %request.name))]
    pub async fn create_product(&self, actor: &Actor, request: CreateProductRequest) -> Result<ProductView> {
        actor.require_staff()?;
        request.validate()?;

        let candidate = request
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| request.name.clone());
        let now = Utc::now();
        let mut product = Product {
            id: Uuid::now_v7(),
            name: request.name.trim().to_string(),
            slug: None,
            description: request.description,
            price: request.price,
            compare_price: request.compare_price,
            currency: request.currency,
            category: request.category,
            subcategory: request.subcategory,
            tags: request.tags,
            images: request.images,
            variants: request.variants,
            inventory: request.inventory,
            shipping: request.shipping,
            seo: request.seo,
            ratings: Ratings::default(),
            sales: 0,
            featured: request.featured,
            is_active: request.is_active,
            created_by: Some(actor.id),
            created_at: now,
            updated_at: now,
        };
        insert_with_unique_slug(self.store.as_ref(), &mut product, &candidate).await?;

        tracing::info!(product_id = %product.id, slug = ?product.slug, "product created");
        self.events
            .publish(DomainEvent::Product(ProductEvent::Created {
                product_id: product.id,
                slug: product.slug.as_ref().map(|s| s.to_string()),
            }))
            .await;
        Ok(product.into())
    }

    #[tracing::instrument(skip(self, update), fields(actor_id = %actor.id))]
    pub async fn update_product(&self, actor: &Actor, id: Uuid, update: ProductUpdate) -> Result<ProductView> {
        actor.require_staff()?;
        update.validate()?;

        let change = update.slug_change();
        let mut patch = update.into_patch();
        let candidate = match change {
            SlugChange::Untouched => None,
            SlugChange::Clear => {
                patch.slug = Some(None);
                None
            }
            SlugChange::Allocate(candidate) => Some(candidate),
        };
        let product = update_with_unique_slug(self.store.as_ref(), id, &mut patch, candidate.as_deref())
            .await?
            .ok_or_else(not_found)?;
        tracing::info!(product_id = %id, slug = ?product.slug, "product updated");
        Ok(product.into())
    }

    /// Flips `featured` without touching the slug.
    pub async fn toggle_featured(&self, actor: &Actor, id: Uuid) -> Result<ProductView> {
        actor.require_staff()?;
        let current = self.load(id).await?;
        let patch = ProductPatch { featured: Some(!current.featured), ..Default::default() };
        let product = self.store.update_product_fields(id, &patch).await?.ok_or_else(not_found)?;
        Ok(product.into())
    }

    pub async fn delete_product(&self, actor: &Actor, id: Uuid) -> Result<()> {
        actor.require_admin()?;
        if !self.store.delete_product(id).await? {
            return Err(not_found());
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(not_found)
    }
}

fn not_found() -> EcommerceError { EcommerceError::NotFound("Product not found".to_string()) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Role;
    use crate::services::OrderService;
    use crate::store::MemoryStore;

    fn setup() -> (ProductService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ProductService::new(store.clone(), EventPublisher::disabled()), store)
    }

    fn editor() -> Actor { Actor::new(Uuid::now_v7(), Role::Editor) }

    fn create(name: &str) -> CreateProductRequest {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "description": "A thing",
            "price": "19.99",
            "category": Uuid::nil(),
            "inventory": { "stock": 20 }
        }))
        .unwrap()
    }

    fn slug_of(view: &ProductView) -> Option<&str> { view.product.slug.as_ref().map(|s| s.as_str()) }

    #[tokio::test]
    async fn test_create_allocates_unique_slugs() {
        let (svc, _) = setup();
        let actor = editor();
        let a = svc.create_product(&actor, create("Classic White T-Shirt")).await.unwrap();
        let b = svc.create_product(&actor, create("Classic White T-Shirt")).await.unwrap();
        let mut explicit = create("Another Shirt");
        explicit.slug = Some("  Classic White T-Shirt ".into());
        let c = svc.create_product(&actor, explicit).await.unwrap();

        assert_eq!(slug_of(&a), Some("classic-white-t-shirt"));
        assert_eq!(slug_of(&b), Some("classic-white-t-shirt-2"));
        assert_eq!(slug_of(&c), Some("classic-white-t-shirt-3"));
        assert_eq!(a.product.created_by, Some(actor.id));
        assert!(a.product.inventory.track_inventory);
    }

    #[tokio::test]
    async fn test_create_requires_staff_and_valid_input() {
        let (svc, _) = setup();
        let customer = Actor::new(Uuid::now_v7(), Role::Customer);
        assert!(matches!(svc.create_product(&customer, create("Mug")).await, Err(EcommerceError::Forbidden(_))));

        let mut bad = create("Mug");
        bad.price = Decimal::new(-1, 0);
        assert!(matches!(svc.create_product(&editor(), bad).await, Err(EcommerceError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_slug_rules() {
        let (svc, _) = setup();
        let actor = editor();
        let mug = svc.create_product(&actor, create("Mug")).await.unwrap();
        let id = mug.product.id;

        // Renaming to the same name keeps the product's own slug.
        let same = svc.update_product(&actor, id, ProductUpdate { name: Some("Mug".into()), ..Default::default() }).await.unwrap();
        assert_eq!(slug_of(&same), Some("mug"));

        let priced = svc
            .update_product(&actor, id, ProductUpdate { price: Some(Decimal::new(5, 0)), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(slug_of(&priced), Some("mug"));

        let renamed = svc.update_product(&actor, id, ProductUpdate { name: Some("Big Mug".into()), ..Default::default() }).await.unwrap();
        assert_eq!(slug_of(&renamed), Some("big-mug"));

        let explicit = svc
            .update_product(
                &actor,
                id,
                ProductUpdate { name: Some("Ignored".into()), slug: Some(Some("Coffee Mug".into())), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(slug_of(&explicit), Some("coffee-mug"));
        assert_eq!(explicit.product.name, "Ignored");

        let cleared = svc
            .update_product(&actor, id, ProductUpdate { name: Some("Plain".into()), slug: Some(None), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(slug_of(&cleared), None);

        let cleared_again = svc
            .update_product(&actor, id, ProductUpdate { slug: Some(Some("   ".into())), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(slug_of(&cleared_again), None);
    }

    #[tokio::test]
    async fn test_update_collision_gets_suffix() {
        let (svc, _) = setup();
        let actor = editor();
        svc.create_product(&actor, create("Lamp")).await.unwrap();
        let desk = svc.create_product(&actor, create("Desk")).await.unwrap();
        let moved = svc
            .update_product(&actor, desk.product.id, ProductUpdate { slug: Some(Some("lamp".into())), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(slug_of(&moved), Some("lamp-2"));
    }

    #[test]
    fn test_update_distinguishes_null_from_missing() {
        let absent: ProductUpdate = serde_json::from_str(r#"{"name": "X"}"#).unwrap();
        let null: ProductUpdate = serde_json::from_str(r#"{"name": "X", "slug": null}"#).unwrap();
        let empty: ProductUpdate = serde_json::from_str(r#"{"slug": ""}"#).unwrap();
        let untouched: ProductUpdate = serde_json::from_str(r#"{"price": 3}"#).unwrap();
        assert_eq!(absent.slug_change(), SlugChange::Allocate("X".into()));
        assert_eq!(null.slug_change(), SlugChange::Clear);
        assert_eq!(empty.slug_change(), SlugChange::Clear);
        assert_eq!(untouched.slug_change(), SlugChange::Untouched);
    }

    fn order_for(product: Uuid, quantity: u32) -> crate::services::orders::CreateOrderRequest {
        serde_json::from_value(serde_json::json!({
            "items": [{ "product": product, "quantity": quantity }],
            "shippingAddress": { "name": "Grace Hopper" },
            "payment": { "method": "card" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_update_keeps_counters_moved_by_orders() {
        let (svc, store) = setup();
        let orders = OrderService::new(store.clone(), EventPublisher::disabled());
        let actor = editor();
        let lamp = svc.create_product(&actor, create("Lamp")).await.unwrap();
        let id = lamp.product.id;

        // Stock moves between the create and the edit; the edit must not carry old counters.
        let customer = Actor::new(Uuid::now_v7(), Role::Customer);
        orders.create_order(&customer, order_for(id, 3)).await.unwrap();
        let update = ProductUpdate { price: Some(Decimal::new(25, 0)), ..Default::default() };
        let updated = svc.update_product(&actor, id, update).await.unwrap();

        assert_eq!(updated.product.price, Decimal::new(25, 0));
        assert_eq!((updated.product.inventory.stock, updated.product.sales), (17, 3));
        let stored = store.get_product(id).await.unwrap().unwrap();
        assert_eq!((stored.inventory.stock, stored.sales), (17, 3));

        let toggled = svc.toggle_featured(&actor, id).await.unwrap();
        assert_eq!((toggled.product.inventory.stock, toggled.product.sales), (17, 3));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_and_orders_agree() {
        let (svc, store) = setup();
        let orders = OrderService::new(store.clone(), EventPublisher::disabled());
        let actor = editor();
        let id = svc.create_product(&actor, create("Lamp")).await.unwrap().product.id;
        let customer = Actor::new(Uuid::now_v7(), Role::Customer);

        let buying = tokio::spawn(async move {
            for _ in 0..10 {
                orders.create_order(&customer, order_for(id, 1)).await.unwrap();
            }
        });
        let editing = tokio::spawn(async move {
            for i in 0..10 {
                let update = ProductUpdate { price: Some(Decimal::new(20 + i, 0)), ..Default::default() };
                svc.update_product(&actor, id, update).await.unwrap();
                svc.toggle_featured(&actor, id).await.unwrap();
            }
        });
        buying.await.unwrap();
        editing.await.unwrap();

        let stored = store.get_product(id).await.unwrap().unwrap();
        assert_eq!((stored.inventory.stock, stored.sales), (10, 10));
        assert_eq!(stored.price, Decimal::new(29, 0));
    }

    #[tokio::test]
    async fn test_explicit_stock_is_written_and_other_inventory_kept() {
        let (svc, _) = setup();
        let actor = editor();
        let id = svc.create_product(&actor, create("Lamp")).await.unwrap().product.id;
        let update: ProductUpdate = serde_json::from_value(serde_json::json!({ "inventory": { "stock": 4 } })).unwrap();
        let updated = svc.update_product(&actor, id, update).await.unwrap();
        assert_eq!(updated.product.inventory.stock, 4);
        assert!(updated.product.inventory.track_inventory);
        assert!(updated.is_low_stock);
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected() {
        let (svc, _) = setup();
        let actor = editor();
        let blank = svc.create_product(&actor, create("   ")).await;
        assert!(matches!(blank, Err(EcommerceError::Validation { .. })));

        let id = svc.create_product(&actor, create("Lamp")).await.unwrap().product.id;
        let update = ProductUpdate { name: Some(" \t ".into()), ..Default::default() };
        assert!(matches!(svc.update_product(&actor, id, update).await, Err(EcommerceError::Validation { .. })));
        assert_eq!(svc.get_product(id).await.unwrap().product.name, "Lamp");
    }

    #[tokio::test]
    async fn test_writes_to_deleted_product_do_not_recreate_it() {
        let (svc, store) = setup();
        let actor = editor();
        let id = svc.create_product(&actor, create("Lamp")).await.unwrap().product.id;
        store.delete_product(id).await.unwrap();

        let update = ProductUpdate { price: Some(Decimal::ONE), ..Default::default() };
        assert!(matches!(svc.update_product(&actor, id, update).await, Err(EcommerceError::NotFound(_))));
        let rename = ProductUpdate { name: Some("Lamp".into()), ..Default::default() };
        assert!(matches!(svc.update_product(&actor, id, rename).await, Err(EcommerceError::NotFound(_))));
        assert!(store.get_product(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toggle_featured_and_delete() {
        let (svc, store) = setup();
        let actor = editor();
        let lamp = svc.create_product(&actor, create("Lamp")).await.unwrap();
        let id = lamp.product.id;

        let toggled = svc.toggle_featured(&actor, id).await.unwrap();
        assert!(toggled.product.featured);
        assert_eq!(slug_of(&toggled), Some("lamp"));

        assert!(matches!(svc.delete_product(&actor, id).await, Err(EcommerceError::Forbidden(_))));
        let admin = Actor::new(Uuid::now_v7(), Role::Admin);
        svc.delete_product(&admin, id).await.unwrap();
        assert!(store.get_product(id).await.unwrap().is_none());
        assert!(matches!(svc.delete_product(&admin, id).await, Err(EcommerceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (svc, _) = setup();
        let actor = editor();
        let lamp = svc.create_product(&actor, create("Desk Lamp")).await.unwrap();
        svc.create_product(&actor, create("Mug")).await.unwrap();
        svc.toggle_featured(&actor, lamp.product.id).await.unwrap();

        let found = svc
            .list_products(ProductListParams { search: Some("LAMP".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(found.total, 1);
        let featured = svc
            .list_products(ProductListParams { featured: Some(true), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(featured.items[0].product.id, lamp.product.id);
        let all = svc.list_products(ProductListParams::default()).await.unwrap();
        assert_eq!((all.total, all.limit), (2, DEFAULT_PAGE_SIZE));
    }
}
