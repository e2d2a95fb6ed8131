//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::aggregates::product::{Currency, Product};
use crate::domain::value_objects::OrderNumber;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: OrderNumber,
    pub user: Uuid,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub billing_address: BillingAddress,
    pub payment: Payment,
    pub pricing: Pricing,
    #[serde(default)]
    pub coupon: Option<AppliedCoupon>,
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking: Option<Tracking>,
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,
    #[serde(default)]
    pub notes: OrderNotes,
    pub currency: Currency,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of a product at the time it was ordered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product: Uuid,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub currency: Currency,
    pub quantity: u32,
    pub variant: String,
}

impl LineItem {
    pub fn snapshot(product: &Product, quantity: u32, variant: Option<String>) -> Self {
        Self {
            product: product.id,
            name: product.name.clone(),
            image: product.images.first().map(|i| i.url.clone()).unwrap_or_default(),
            price: product.price,
            currency: product.currency,
            quantity,
            variant: variant.unwrap_or_default(),
        }
    }

    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub address: String,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingAddress {
    pub name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl From<&ShippingAddress> for BillingAddress {
    fn from(a: &ShippingAddress) -> Self {
        Self {
            name: Some(a.name.clone()),
            street: Some(a.street.clone()),
            city: Some(a.city.clone()),
            state: Some(a.state.clone()),
            zip_code: Some(a.zip_code.clone()),
            country: Some(a.country.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { Card, Stripe, Paypal, Cod, Bank, Local, Social }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Completed, Failed, Refunded }

/// Computed once at creation; never recomputed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl Pricing {
    pub fn new(subtotal: Decimal, shipping: Decimal, tax: Decimal, discount: Decimal) -> Self {
        Self { subtotal, shipping, tax, discount, total: subtotal + shipping + tax - discount }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub discount: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tracking {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderNotes {
    pub customer: Option<String>,
    pub admin: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled, Refunded }

impl OrderStatus {
    /// Statuses that prove the customer received the product.
    pub const FULFILLED: [OrderStatus; 2] = [Self::Shipped, Self::Delivered];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Inventory side effect a status change implies for every line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockEffect {
    /// Same status; the transition is a no-op.
    Unchanged,
    /// Neither side is `cancelled`; only the status fields change.
    None,
    /// Entering `cancelled`: revert sales and restock.
    Release,
    /// Leaving `cancelled`: re-apply sales and unstock.
    Reclaim,
}

/// Everything needed to build a new order besides the line items.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub user: Uuid,
    pub shipping_address: ShippingAddress,
    pub billing_address: Option<BillingAddress>,
    pub payment: Payment,
    pub coupon: Option<AppliedCoupon>,
    pub notes: OrderNotes,
}

impl Order {
    pub fn create(input: NewOrder, items: Vec<LineItem>, pricing: Pricing, now: DateTime<Utc>) -> Self {
        let currency = items.first().map(|i| i.currency).unwrap_or_default();
        let billing_address = input
            .billing_address
            .unwrap_or_else(|| BillingAddress::from(&input.shipping_address));
        Self {
            id: Uuid::now_v7(),
            order_number: OrderNumber::generate(now),
            user: input.user,
            items,
            shipping_address: input.shipping_address,
            billing_address,
            payment: input.payment,
            pricing,
            coupon: input.coupon,
            status: OrderStatus::Pending,
            tracking: None,
            status_history: vec![],
            notes: input.notes,
            currency,
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_cancelled(&self) -> bool { self.status == OrderStatus::Cancelled }
    pub fn contains_product(&self, product: Uuid) -> bool { self.items.iter().any(|i| i.product == product) }

    pub fn stock_effect(&self, next: OrderStatus) -> StockEffect {
        match (self.status, next) {
            (current, next) if current == next => StockEffect::Unchanged,
            (_, OrderStatus::Cancelled) => StockEffect::Release,
            (OrderStatus::Cancelled, _) => StockEffect::Reclaim,
            _ => StockEffect::None,
        }
    }

    /// Record a status change. Inventory reconciliation is the caller's job and
    /// must already have succeeded; this only updates the order document.
    pub fn apply_transition(&mut self, next: OrderStatus, note: Option<String>, now: DateTime<Utc>) {
        if self.status == next {
            return;
        }
        if next == OrderStatus::Cancelled {
            self.cancelled_at = Some(now);
        } else {
            self.cancelled_at = None;
        }
        if next == OrderStatus::Delivered {
            self.delivered_at = Some(now);
        }
        self.status = next;
        self.status_history.push(StatusHistoryEntry { status: next, note, updated_at: now });
        self.updated_at = now;
    }

    pub fn set_tracking(&mut self, tracking: Tracking) {
        self.tracking = Some(tracking);
        self.updated_at = Utc::now();
    }
}
