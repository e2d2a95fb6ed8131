//! Order lifecycle
//!
//! Creating an order reserves stock for every line item; moving an order into
//! `cancelled` releases it again and moving it out of `cancelled` reclaims it.
//!
//! Product writes are sequential single-document updates with no rollback.
//! Stock is checked for every line before the first write, so a shortfall
//! leaves every product untouched, but a store failure partway through the
//! writes leaves the products written so far mutated.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::coupon::normalize_code;
use crate::domain::aggregates::order::{AppliedCoupon, BillingAddress, OrderNotes, Payment, ShippingAddress};
use crate::domain::aggregates::{
    is_coupon_valid, LineItem, NewOrder, Order, OrderStatus, Pricing, Product, StockEffect, Tracking,
};
use crate::domain::events::{DomainEvent, EventPublisher, OrderEvent, ProductEvent};
use crate::domain::value_objects::{Actor, Page, PageRequest};
use crate::services::non_negative;
use crate::store::{CouponStore, OrderQuery, OrderStore, ProductStore, Store};
use crate::{EcommerceError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[validate]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub billing_address: Option<BillingAddress>,
    pub payment: Payment,
    #[serde(default)]
    pub coupon: Option<AppliedCoupon>,
    #[serde(default)]
    #[validate]
    pub pricing: Option<PricingOverrides>,
    /// Customer note.
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product: Uuid,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<String>,
}

/// Amounts the client computed itself; the subtotal is always computed here.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PricingOverrides {
    #[validate(custom = "non_negative")]
    pub shipping: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub tax: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub discount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// OrderService
// =============================================================================

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    events: EventPublisher,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    #[tracing::instrument(skip(self, request), fields(user_id = %actor.id, lines = request.items.len()))]
    pub async fn create_order(&self, actor: &Actor, request: CreateOrderRequest) -> Result<Order> {
        if request.items.is_empty() {
            return Err(EcommerceError::validation("No order items"));
        }
        request.validate()?;
        if request.shipping_address.name.trim().is_empty() {
            return Err(EcommerceError::validation("Shipping address name is required"));
        }

        let lines: Vec<(Uuid, u32)> = request.items.iter().map(|i| (i.product, i.quantity)).collect();
        let mut products = self.check_stock(&lines, true).await?;

        let now = Utc::now();
        let subtotal: Decimal = request
            .items
            .iter()
            .filter_map(|i| products.get(&i.product).map(|p| p.price * Decimal::from(i.quantity)))
            .sum();
        let coupon_code = request
            .coupon
            .as_ref()
            .and_then(|c| c.code.as_deref())
            .map(normalize_code)
            .filter(|c| !c.is_empty());
        let applicable_coupon = match &coupon_code {
            Some(code) => self
                .store
                .find_coupon_by_code(code)
                .await?
                .filter(|c| is_coupon_valid(c, now, subtotal)),
            None => None,
        };

        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let Some(product) = products.get_mut(&item.product) else { continue };
            product.reserve(item.quantity)?;
            self.store.save_product_counters(product).await?;
            self.publish_stock(product).await;
            items.push(LineItem::snapshot(product, item.quantity, item.variant.clone()));
        }

        let overrides = request.pricing.unwrap_or_default();
        let pricing = Pricing::new(
            subtotal,
            overrides.shipping.unwrap_or_default(),
            overrides.tax.unwrap_or_default(),
            overrides.discount.unwrap_or_default(),
        );
        let coupon = request.coupon.map(|c| AppliedCoupon { code: coupon_code.clone(), discount: c.discount });
        let order = Order::create(
            NewOrder {
                user: actor.id,
                shipping_address: request.shipping_address,
                billing_address: request.billing_address,
                payment: request.payment,
                coupon,
                notes: OrderNotes { customer: request.notes, admin: None },
            },
            items,
            pricing,
            now,
        );
        self.store.insert_order(&order).await?;

        if let Some(coupon) = applicable_coupon {
            if let Err(e) = self.store.increment_coupon_usage(coupon.id).await {
                tracing::warn!(error = %e, code = %coupon.code, order_id = %order.id, "coupon usage update failed");
            }
        }

        tracing::info!(order_id = %order.id, order_number = %order.order_number, total = %order.pricing.total, "order created");
        self.events
            .publish(DomainEvent::Order(OrderEvent::Created {
                order_id: order.id,
                order_number: order.order_number.to_string(),
                user_id: order.user,
                total: order.pricing.total,
            }))
            .await;
        Ok(order)
    }

    /// Staff-only status change with inventory reconciliation.
    #[tracing::instrument(skip(self, note), fields(actor_id = %actor.id))]
    pub async fn set_order_status(
        &self,
        actor: &Actor,
        id: Uuid,
        next: OrderStatus,
        note: Option<String>,
    ) -> Result<Order> {
        actor.require_staff()?;
        let mut order = self.load(id).await?;
        let previous = order.status;

        match order.stock_effect(next) {
            StockEffect::Unchanged => return Ok(order),
            StockEffect::Release => self.release_stock(&order).await?,
            StockEffect::Reclaim => self.reclaim_stock(&order).await?,
            StockEffect::None => {}
        }

        order.apply_transition(next, note, Utc::now());
        self.store.save_order(&order).await?;

        tracing::info!(order_id = %order.id, from = %previous, to = %next, "order status changed");
        self.events
            .publish(DomainEvent::Order(OrderEvent::StatusChanged { order_id: order.id, from: previous, to: next }))
            .await;
        Ok(order)
    }

    /// Cancellation by the order's owner (or an admin). Cancelling an already
    /// cancelled order returns it unchanged.
    #[tracing::instrument(skip(self, note), fields(actor_id = %actor.id))]
    pub async fn cancel_own_order(&self, actor: &Actor, id: Uuid, note: Option<String>) -> Result<Order> {
        let mut order = self.load(id).await?;
        actor.require_owner_or_admin(order.user)?;
        if order.is_cancelled() {
            return Ok(order);
        }

        self.release_stock(&order).await?;
        order.apply_transition(OrderStatus::Cancelled, note, Utc::now());
        self.store.save_order(&order).await?;

        tracing::info!(order_id = %order.id, "order cancelled");
        self.events
            .publish(DomainEvent::Order(OrderEvent::Cancelled { order_id: order.id, by: actor.id }))
            .await;
        Ok(order)
    }

    pub async fn update_tracking(&self, actor: &Actor, id: Uuid, tracking: Tracking) -> Result<Order> {
        actor.require_staff()?;
        let mut order = self.load(id).await?;
        order.set_tracking(tracking);
        self.store.save_order(&order).await?;
        Ok(order)
    }

    pub async fn get_order(&self, actor: &Actor, id: Uuid) -> Result<Order> {
        let order = self.load(id).await?;
        actor.require_owner_or_admin(order.user)?;
        Ok(order)
    }

    /// Admins see every order, everyone else only their own. Newest first.
    pub async fn list_orders(
        &self,
        actor: &Actor,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let query = OrderQuery { user: (!actor.is_admin()).then_some(actor.id), status };
        Ok(self.store.list_orders(&query, page).await?)
    }

    async fn load(&self, id: Uuid) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| EcommerceError::NotFound("Order not found".to_string()))
    }

    /// Load the products referenced by `lines` and verify each can cover the
    /// combined quantity of all its lines. Missing products fail with
    /// `NotFound` when `require_all` is set and are skipped otherwise.
    async fn check_stock(&self, lines: &[(Uuid, u32)], require_all: bool) -> Result<HashMap<Uuid, Product>> {
        let mut products = HashMap::new();
        let mut wanted: HashMap<Uuid, u32> = HashMap::new();
        for (id, quantity) in lines {
            if !products.contains_key(id) {
                match self.store.get_product(*id).await? {
                    Some(product) => {
                        products.insert(*id, product);
                    }
                    None if require_all => return Err(EcommerceError::NotFound(format!("Product {id} not found"))),
                    None => {
                        tracing::debug!(product_id = %id, "product no longer exists, skipping");
                        continue;
                    }
                }
            }
            let total = wanted.entry(*id).or_default();
            *total = total.saturating_add(*quantity);
        }

        for (id, _) in lines {
            if let (Some(product), Some(total)) = (products.get(id), wanted.get(id)) {
                if !product.has_stock_for(*total) {
                    return Err(product.insufficient_stock(*total));
                }
            }
        }
        Ok(products)
    }

    /// Revert sales and restock every line item. Missing products are skipped.
    async fn release_stock(&self, order: &Order) -> Result<()> {
        for item in &order.items {
            let Some(mut product) = self.store.get_product(item.product).await? else {
                tracing::debug!(product_id = %item.product, "product no longer exists, skipping restock");
                continue;
            };
            product.release(item.quantity);
            self.store.save_product_counters(&product).await?;
            self.publish_stock(&product).await;
        }
        Ok(())
    }

    /// Re-apply sales and unstock every line item of a cancelled order. Fails
    /// without writing anything if any tracked product is short.
    async fn reclaim_stock(&self, order: &Order) -> Result<()> {
        let lines: Vec<(Uuid, u32)> = order.items.iter().map(|i| (i.product, i.quantity)).collect();
        let mut products = self.check_stock(&lines, false).await?;
        for item in &order.items {
            let Some(product) = products.get_mut(&item.product) else { continue };
            product.reserve(item.quantity)?;
            self.store.save_product_counters(product).await?;
            self.publish_stock(product).await;
        }
        Ok(())
    }

    async fn publish_stock(&self, product: &Product) {
        self.events
            .publish(DomainEvent::Product(ProductEvent::StockAdjusted {
                product_id: product.id,
                stock: product.inventory.stock,
                sales: product.sales,
            }))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::coupon::tests::coupon;
    use crate::domain::aggregates::order::{PaymentMethod, PaymentStatus};
    use crate::domain::aggregates::product::tests::product;
    use crate::domain::value_objects::Role;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn setup() -> (OrderService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (OrderService::new(store.clone(), EventPublisher::disabled()), store)
    }

    fn customer() -> Actor { Actor::new(Uuid::now_v7(), Role::Customer) }
    fn admin() -> Actor { Actor::new(Uuid::now_v7(), Role::Admin) }

    fn request(lines: &[(Uuid, u32)]) -> CreateOrderRequest {
        CreateOrderRequest {
            items: lines
                .iter()
                .map(|(product, quantity)| OrderItemRequest { product: *product, quantity: *quantity, variant: None })
                .collect(),
            shipping_address: ShippingAddress { name: "Ada Lovelace".into(), ..Default::default() },
            billing_address: None,
            payment: Payment { method: PaymentMethod::Card, transaction_id: None, status: PaymentStatus::Pending, paid_at: None },
            coupon: None,
            pricing: None,
            notes: None,
        }
    }

    async fn seed(store: &MemoryStore, name: &str, price: i64, stock: u32, tracked: bool) -> Uuid {
        let p = product(name, price, stock, tracked);
        store.insert_product(&p).await.unwrap();
        p.id
    }

    async fn counters(store: &MemoryStore, id: Uuid) -> (u32, u32) {
        let p = store.get_product(id).await.unwrap().unwrap();
        (p.inventory.stock, p.sales)
    }

    #[tokio::test]
    async fn test_create_order_reserves_stock_and_prices() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let poster = seed(&store, "Poster", 5, 0, false).await;

        let mut req = request(&[(mug, 2), (poster, 3)]);
        req.pricing = Some(PricingOverrides {
            shipping: Some(Decimal::new(4, 0)),
            tax: Some(Decimal::new(2, 0)),
            discount: Some(Decimal::new(1, 0)),
        });
        let order = svc.create_order(&customer(), req).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.pricing.subtotal, Decimal::new(39, 0));
        assert_eq!(order.pricing.total, Decimal::new(44, 0));
        assert!(order.order_number.as_str().starts_with("ORD-"));
        assert_eq!(counters(&store, mug).await, (3, 2));
        assert_eq!(counters(&store, poster).await, (0, 3));
        assert!(store.get_order(order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_order_rejects_empty_and_invalid_input() {
        let (svc, store) = setup();
        let err = svc.create_order(&customer(), request(&[])).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Validation { ref message, .. } if message == "No order items"));

        let mug = seed(&store, "Mug", 12, 5, true).await;
        let err = svc.create_order(&customer(), request(&[(mug, 0)])).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Validation { details: Some(_), .. }));

        let mut req = request(&[(mug, 1)]);
        req.pricing = Some(PricingOverrides { discount: Some(Decimal::new(-5, 0)), ..Default::default() });
        assert!(matches!(svc.create_order(&customer(), req).await, Err(EcommerceError::Validation { .. })));
        assert_eq!(counters(&store, mug).await, (5, 0));
    }

    #[tokio::test]
    async fn test_create_order_with_unknown_product() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let err = svc.create_order(&customer(), request(&[(mug, 1), (Uuid::now_v7(), 1)])).await.unwrap_err();
        assert!(matches!(err, EcommerceError::NotFound(_)));
        assert_eq!(counters(&store, mug).await, (5, 0));
    }

    #[tokio::test]
    async fn test_insufficient_stock_persists_nothing() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let lamp = seed(&store, "Lamp", 30, 2, true).await;

        let err = svc.create_order(&customer(), request(&[(mug, 1), (lamp, 3)])).await.unwrap_err();
        assert!(matches!(err, EcommerceError::InsufficientStock { requested: 3, available: 2, .. }));
        assert_eq!(counters(&store, mug).await, (5, 0));
        assert_eq!(counters(&store, lamp).await, (2, 0));

        let all = store.list_orders(&OrderQuery::default(), PageRequest::new(None, None, 10)).await.unwrap();
        assert_eq!(all.total, 0);
    }

    #[tokio::test]
    async fn test_repeated_lines_share_the_stock_check() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 3, true).await;
        let err = svc.create_order(&customer(), request(&[(mug, 2), (mug, 2)])).await.unwrap_err();
        assert!(matches!(err, EcommerceError::InsufficientStock { requested: 4, .. }));
        assert_eq!(counters(&store, mug).await, (3, 0));
    }

    #[tokio::test]
    async fn test_cancel_then_reinstate_restores_counters() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let order = svc.create_order(&customer(), request(&[(mug, 2)])).await.unwrap();
        assert_eq!(counters(&store, mug).await, (3, 2));

        let staff = Actor::new(Uuid::now_v7(), Role::Editor);
        let cancelled = svc.set_order_status(&staff, order.id, OrderStatus::Cancelled, Some("fraud".into())).await.unwrap();
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(counters(&store, mug).await, (5, 0));

        let reinstated = svc.set_order_status(&staff, order.id, OrderStatus::Pending, None).await.unwrap();
        assert!(reinstated.cancelled_at.is_none());
        assert_eq!(counters(&store, mug).await, (3, 2));
        assert_eq!(reinstated.status_history.len(), 2);
        assert_eq!(reinstated.status_history[0].note.as_deref(), Some("fraud"));
    }

    #[tokio::test]
    async fn test_same_status_is_noop() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let order = svc.create_order(&customer(), request(&[(mug, 1)])).await.unwrap();
        let same = svc.set_order_status(&admin(), order.id, OrderStatus::Pending, None).await.unwrap();
        assert!(same.status_history.is_empty());
        assert_eq!(counters(&store, mug).await, (4, 1));
    }

    #[tokio::test]
    async fn test_repeated_cancel_never_drops_sales_below_zero() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let owner = customer();
        let order = svc.create_order(&owner, request(&[(mug, 2)])).await.unwrap();

        // Sales on the product were reset by something else in the meantime.
        let mut p = store.get_product(mug).await.unwrap().unwrap();
        p.sales = 1;
        store.save_product_counters(&p).await.unwrap();

        let first = svc.cancel_own_order(&owner, order.id, None).await.unwrap();
        let second = svc.cancel_own_order(&owner, order.id, Some("again".into())).await.unwrap();
        assert_eq!(first.status, OrderStatus::Cancelled);
        assert_eq!(second.status_history.len(), 1);
        assert_eq!(counters(&store, mug).await, (5, 0));
    }

    #[tokio::test]
    async fn test_reinstate_without_stock_changes_nothing() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let lamp = seed(&store, "Lamp", 30, 2, true).await;
        let owner = customer();
        let order = svc.create_order(&owner, request(&[(mug, 1), (lamp, 2)])).await.unwrap();
        svc.cancel_own_order(&owner, order.id, None).await.unwrap();

        // The lamp sold out through another channel.
        let mut p = store.get_product(lamp).await.unwrap().unwrap();
        p.inventory.stock = 1;
        store.save_product_counters(&p).await.unwrap();

        let err = svc.set_order_status(&admin(), order.id, OrderStatus::Processing, None).await.unwrap_err();
        assert!(matches!(err, EcommerceError::InsufficientStock { requested: 2, available: 1, .. }));
        assert_eq!(counters(&store, mug).await, (5, 0));
        assert_eq!(counters(&store, lamp).await, (1, 0));
        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
        assert!(stored.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_at_follows_status() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 10, true).await;
        let order = svc.create_order(&customer(), request(&[(mug, 1)])).await.unwrap();
        let boss = admin();
        for next in [
            OrderStatus::Processing,
            OrderStatus::Cancelled,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            let o = svc.set_order_status(&boss, order.id, next, None).await.unwrap();
            assert_eq!(o.cancelled_at.is_some(), o.status == OrderStatus::Cancelled);
        }
        let o = store.get_order(order.id).await.unwrap().unwrap();
        assert!(o.delivered_at.is_some());
        assert_eq!(counters(&store, mug).await, (9, 1));
    }

    #[tokio::test]
    async fn test_release_skips_deleted_products() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let lamp = seed(&store, "Lamp", 30, 5, true).await;
        let owner = customer();
        let order = svc.create_order(&owner, request(&[(mug, 1), (lamp, 1)])).await.unwrap();
        store.delete_product(mug).await.unwrap();

        svc.cancel_own_order(&owner, order.id, None).await.unwrap();
        assert_eq!(counters(&store, lamp).await, (5, 0));
        let back = svc.set_order_status(&admin(), order.id, OrderStatus::Pending, None).await.unwrap();
        assert_eq!(back.status, OrderStatus::Pending);
        assert_eq!(counters(&store, lamp).await, (4, 1));
    }

    #[tokio::test]
    async fn test_valid_coupon_usage_is_counted_once() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 30, 10, true).await;
        let summer = coupon("summer", Utc::now() + Duration::days(30));
        let expired = coupon("old", Utc::now() - Duration::days(30));
        store.insert_coupon(&summer).await.unwrap();
        store.insert_coupon(&expired).await.unwrap();

        let mut req = request(&[(mug, 2)]);
        req.coupon = Some(AppliedCoupon { code: Some(" summer ".into()), discount: Some(Decimal::new(6, 0)) });
        let order = svc.create_order(&customer(), req).await.unwrap();
        assert_eq!(order.coupon.as_ref().and_then(|c| c.code.as_deref()), Some("SUMMER"));

        let mut req = request(&[(mug, 2)]);
        req.coupon = Some(AppliedCoupon { code: Some("old".into()), discount: None });
        svc.create_order(&customer(), req).await.unwrap();

        // Below the minimum purchase of 50.
        let mut req = request(&[(mug, 1)]);
        req.coupon = Some(AppliedCoupon { code: Some("SUMMER".into()), discount: None });
        svc.create_order(&customer(), req).await.unwrap();

        let summer = store.find_coupon_by_code("SUMMER").await.unwrap().unwrap();
        let expired = store.find_coupon_by_code("OLD").await.unwrap().unwrap();
        assert_eq!(summer.used_count, 1);
        assert_eq!(expired.used_count, 0);
    }

    #[tokio::test]
    async fn test_authorization() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 5, true).await;
        let owner = customer();
        let stranger = customer();
        let order = svc.create_order(&owner, request(&[(mug, 1)])).await.unwrap();

        assert!(matches!(
            svc.set_order_status(&owner, order.id, OrderStatus::Shipped, None).await,
            Err(EcommerceError::Forbidden(_))
        ));
        assert!(matches!(svc.cancel_own_order(&stranger, order.id, None).await, Err(EcommerceError::Forbidden(_))));
        assert!(matches!(svc.get_order(&stranger, order.id).await, Err(EcommerceError::Forbidden(_))));
        assert!(matches!(
            svc.update_tracking(&owner, order.id, Tracking::default()).await,
            Err(EcommerceError::Forbidden(_))
        ));
        assert!(svc.get_order(&owner, order.id).await.is_ok());
        assert!(svc.cancel_own_order(&admin(), order.id, None).await.is_ok());
        assert!(matches!(svc.get_order(&owner, Uuid::now_v7()).await, Err(EcommerceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_and_tracking() {
        let (svc, store) = setup();
        let mug = seed(&store, "Mug", 12, 50, true).await;
        let (alice, bob) = (customer(), customer());
        let first = svc.create_order(&alice, request(&[(mug, 1)])).await.unwrap();
        svc.create_order(&alice, request(&[(mug, 1)])).await.unwrap();
        svc.create_order(&bob, request(&[(mug, 1)])).await.unwrap();

        let page = PageRequest::new(None, None, DEFAULT_PAGE_SIZE);
        assert_eq!(svc.list_orders(&alice, None, page).await.unwrap().total, 2);
        assert_eq!(svc.list_orders(&admin(), None, page).await.unwrap().total, 3);

        svc.cancel_own_order(&alice, first.id, None).await.unwrap();
        let cancelled = svc.list_orders(&alice, Some(OrderStatus::Cancelled), page).await.unwrap();
        assert_eq!(cancelled.items.len(), 1);

        let staff = Actor::new(Uuid::now_v7(), Role::Editor);
        let tracked = svc
            .update_tracking(
                &staff,
                first.id,
                Tracking { carrier: Some("DHL".into()), tracking_number: Some("123".into()), tracking_url: None },
            )
            .await
            .unwrap();
        assert_eq!(tracked.tracking.and_then(|t| t.carrier).as_deref(), Some("DHL"));
    }
}
