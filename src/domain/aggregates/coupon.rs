//! Coupon Aggregate

use chrono::{DateTime, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    /// Stored trimmed and uppercase.
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_purchase: Decimal,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// `None` means unlimited.
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default = "default_per_user_limit")]
    pub per_user_limit: u32,
    #[serde(default)]
    pub applicable_products: Vec<Uuid>,
    #[serde(default)]
    pub applicable_categories: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType { Percentage, Fixed }

fn default_per_user_limit() -> u32 { 1 }

pub fn normalize_code(raw: &str) -> String { raw.trim().to_uppercase() }

/// Last instant of the end date's calendar day (UTC).
fn end_of_day(end: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = end.date_naive().and_time(NaiveTime::MIN).and_utc();
    midnight + Duration::days(1) - Duration::milliseconds(1)
}

/// Whether `coupon` can be applied at `now` to a purchase of `purchase_amount`.
pub fn is_coupon_valid(coupon: &Coupon, now: DateTime<Utc>, purchase_amount: Decimal) -> bool {
    coupon.is_valid_at(now) && purchase_amount >= coupon.min_purchase
}

impl Coupon {
    /// Time window, active flag and remaining usage; ignores the minimum purchase.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && now >= self.start_date
            && now <= end_of_day(self.end_date)
            && self.usage_limit.map_or(true, |limit| self.used_count < limit)
    }

    pub fn discount_for(&self, amount: Decimal) -> Decimal {
        let raw = match self.discount_type {
            DiscountType::Percentage => {
                let pct = amount * self.discount_value / Decimal::ONE_HUNDRED;
                self.max_discount.map_or(pct, |cap| pct.min(cap))
            }
            DiscountType::Fixed => self.discount_value,
        };
        raw.min(amount).max(Decimal::ZERO).round_dp(2)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn coupon(code: &str, end: DateTime<Utc>) -> Coupon {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Coupon {
            id: Uuid::now_v7(),
            code: normalize_code(code),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::new(10, 0),
            min_purchase: Decimal::new(50, 0),
            max_discount: Some(Decimal::new(15, 0)),
            start_date: start,
            end_date: end,
            usage_limit: Some(2),
            used_count: 0,
            per_user_limit: 1,
            applicable_products: vec![],
            applicable_categories: vec![],
            is_active: true,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_end_date_is_inclusive_through_end_of_day() {
        let end = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let c = coupon("summer", end);
        let last_ms = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap() + Duration::milliseconds(999);
        let next_day = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        assert!(is_coupon_valid(&c, last_ms, Decimal::new(60, 0)));
        assert!(!is_coupon_valid(&c, next_day, Decimal::new(60, 0)));
    }

    #[test]
    fn test_not_yet_started_inactive_or_used_up() {
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let mut c = coupon("x", end);
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert!(!c.is_valid_at(before));
        assert!(c.is_valid_at(during));

        c.used_count = 2;
        assert!(!c.is_valid_at(during));
        c.usage_limit = None;
        assert!(c.is_valid_at(during));
        c.is_active = false;
        assert!(!c.is_valid_at(during));
    }

    #[test]
    fn test_min_purchase() {
        let c = coupon("x", Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert!(!is_coupon_valid(&c, now, Decimal::new(4999, 2)));
        assert!(is_coupon_valid(&c, now, Decimal::new(50, 0)));
    }

    #[test]
    fn test_discount_caps() {
        let mut c = coupon("x", Utc::now());
        assert_eq!(c.discount_for(Decimal::new(100, 0)), Decimal::new(10, 0));
        assert_eq!(c.discount_for(Decimal::new(400, 0)), Decimal::new(15, 0));
        c.discount_type = DiscountType::Fixed;
        c.discount_value = Decimal::new(30, 0);
        assert_eq!(c.discount_for(Decimal::new(20, 0)), Decimal::new(20, 0));
    }
}
