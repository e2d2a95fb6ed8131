//! Value Objects for E-commerce

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::EcommerceError;

/// URL-safe product identifier: lowercase ASCII letters, digits and single hyphens.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Wrap an already-normalized slug. Callers outside the allocator should
    /// go through [`crate::domain::slug::normalize`].
    pub(crate) fn from_normalized(value: String) -> Self { Self(value) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Human-readable order reference, `ORD-YYYYMMDD-<6 digits><3 digits>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// The first six digits are the tail of the millisecond timestamp, the last
    /// three are random. Two orders created in the same millisecond can collide;
    /// the unique index on the order number rejects the second insert.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let millis = now.timestamp_millis().unsigned_abs() % 1_000_000;
        let suffix: u16 = rand::thread_rng().gen_range(0..1000);
        Self(format!("ORD-{}-{:06}{:03}", now.format("%Y%m%d"), millis, suffix))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Role supplied by the upstream authentication gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Customer,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            "customer" | "user" => Some(Self::Customer),
            _ => None,
        }
    }
}

/// The authenticated caller of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self { Self { id, role } }
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
    pub fn is_staff(&self) -> bool { matches!(self.role, Role::Admin | Role::Editor) }

    pub fn require_admin(&self) -> Result<(), EcommerceError> {
        if self.is_admin() { Ok(()) } else { Err(EcommerceError::not_authorized()) }
    }

    /// Admins and editors.
    pub fn require_staff(&self) -> Result<(), EcommerceError> {
        if self.is_staff() { Ok(()) } else { Err(EcommerceError::not_authorized()) }
    }

    /// The owner of a resource, or an admin.
    pub fn require_owner_or_admin(&self, owner: Uuid) -> Result<(), EcommerceError> {
        if self.id == owner || self.is_admin() { Ok(()) } else { Err(EcommerceError::not_authorized()) }
    }
}

/// 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT),
        }
    }
    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted collection.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .collect();
        Self { items, total, page: request.page, limit: request.limit }
    }
    pub fn total_pages(&self) -> u64 { self.total.div_ceil(u64::from(self.limit.max(1))) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let number = OrderNumber::generate(now);
        let s = number.as_str();
        assert!(s.starts_with("ORD-20240309-"));
        let tail = &s["ORD-20240309-".len()..];
        assert_eq!(tail.len(), 9);
        assert!(tail.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::Customer));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn test_page_slicing() {
        let page = Page::from_sorted((1..=25).collect::<Vec<_>>(), PageRequest::new(Some(3), Some(10), 12));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
    }
}
