//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Slug;
use crate::EcommerceError;

pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Slug>,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
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
    pub ratings: Ratings,
    #[serde(default)]
    pub sales: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Bdt,
    Inr,
    Jpy,
    Cny,
    Aud,
    Cad,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Variant axis such as "Size" with options `["S", "M", "L"]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantOption {
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,
    #[serde(default = "default_true")]
    pub track_inventory: bool,
}

impl Default for Inventory {
    fn default() -> Self {
        Self { stock: 0, sku: None, low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD, track_inventory: true }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub free_shipping: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoData {
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub meta_keywords: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    pub average: f64,
    pub count: u32,
}

impl Ratings {
    pub fn from_scores(scores: &[u8]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
        Self { average: f64::from(sum) / scores.len() as f64, count: scores.len() as u32 }
    }
}

fn default_true() -> bool { true }
fn default_low_stock_threshold() -> u32 { DEFAULT_LOW_STOCK_THRESHOLD }

impl Product {
    pub fn tracks_inventory(&self) -> bool { self.inventory.track_inventory }
    pub fn is_low_stock(&self) -> bool { self.inventory.stock <= self.inventory.low_stock_threshold }

    /// Stock is only a constraint when inventory tracking is on.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        !self.tracks_inventory() || self.inventory.stock >= quantity
    }

    /// Count `quantity` units as sold, taking them out of stock when tracked.
    pub fn reserve(&mut self, quantity: u32) -> Result<(), EcommerceError> {
        if !self.has_stock_for(quantity) {
            return Err(self.insufficient_stock(quantity));
        }
        self.sales = self.sales.saturating_add(quantity);
        if self.tracks_inventory() {
            self.inventory.stock -= quantity;
        }
        self.touch();
        Ok(())
    }

    /// Undo a sale of `quantity` units. Sales never drop below zero.
    pub fn release(&mut self, quantity: u32) {
        self.sales = self.sales.saturating_sub(quantity);
        if self.tracks_inventory() {
            self.inventory.stock = self.inventory.stock.saturating_add(quantity);
        }
        self.touch();
    }

    pub fn insufficient_stock(&self, requested: u32) -> EcommerceError {
        EcommerceError::InsufficientStock {
            product_id: self.id,
            name: self.name.clone(),
            requested,
            available: self.inventory.stock,
        }
    }

    /// Whether a case-insensitive `needle` occurs in the name, description or a tag.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }

    pub fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Field-level product write. Only the present fields are stored; `sales`
/// and `ratings` are never part of a patch, and `inventory.stock` only when
/// the caller sets it explicitly.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` unsets the slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<Option<Slug>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_price: Option<Option<Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ProductImage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<VariantOption>>,
    /// Merged key by key into the stored inventory, see [`InventoryPatch`].
    #[serde(skip)]
    pub inventory: Option<InventoryPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_inventory: Option<bool>,
}

impl ProductPatch {
    /// Apply to an in-memory copy, stamping `updated_at`.
    pub fn apply_to(&self, p: &mut Product, now: DateTime<Utc>) {
        if let Some(v) = &self.name { p.name = v.clone(); }
        if let Some(v) = &self.slug { p.slug = v.clone(); }
        if let Some(v) = &self.description { p.description = v.clone(); }
        if let Some(v) = self.price { p.price = v; }
        if let Some(v) = self.compare_price { p.compare_price = v; }
        if let Some(v) = self.currency { p.currency = v; }
        if let Some(v) = self.category { p.category = v; }
        if let Some(v) = &self.subcategory { p.subcategory = Some(v.clone()); }
        if let Some(v) = &self.tags { p.tags = v.clone(); }
        if let Some(v) = &self.images { p.images = v.clone(); }
        if let Some(v) = &self.variants { p.variants = v.clone(); }
        if let Some(inv) = &self.inventory {
            if let Some(v) = inv.stock { p.inventory.stock = v; }
            if let Some(v) = &inv.sku { p.inventory.sku = Some(v.clone()); }
            if let Some(v) = inv.low_stock_threshold { p.inventory.low_stock_threshold = v; }
            if let Some(v) = inv.track_inventory { p.inventory.track_inventory = v; }
        }
        if let Some(v) = &self.shipping { p.shipping = v.clone(); }
        if let Some(v) = &self.seo { p.seo = v.clone(); }
        if let Some(v) = self.featured { p.featured = v; }
        if let Some(v) = self.is_active { p.is_active = v; }
        p.updated_at = now;
    }
}

/// Product as returned over the API, with derived fields.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub is_low_stock: bool,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self { is_low_stock: product.is_low_stock(), product }
    }
}
