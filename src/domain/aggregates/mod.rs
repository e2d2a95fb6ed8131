//! Aggregates module
pub mod banner;
pub mod coupon;
pub mod order;
pub mod product;
pub mod review;
pub mod settings;

pub use banner::Banner;
pub use coupon::{is_coupon_valid, Coupon, DiscountType};
pub use order::{LineItem, NewOrder, Order, OrderStatus, Pricing, StockEffect, Tracking};
pub use product::{Currency, Inventory, InventoryPatch, Product, ProductPatch, ProductView, Ratings};
pub use review::Review;
pub use settings::{PublicSettings, Settings};
