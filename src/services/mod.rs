//! Application services
//!
//! Each service owns the business rules for one aggregate and talks to the
//! store through the [`Store`](crate::store::Store) traits. Authorization
//! checks take the caller as an explicit [`Actor`](crate::domain::value_objects::Actor).

pub mod banners;
pub mod coupons;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;

pub use banners::BannerService;
pub use coupons::CouponService;
pub use orders::OrderService;
pub use products::ProductService;
pub use reviews::ReviewService;
pub use settings::SettingsService;

use rust_decimal::Decimal;
use validator::ValidationError;

/// `validator` custom check for money amounts.
pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

/// `validator` custom check for required text that must not be only whitespace.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
