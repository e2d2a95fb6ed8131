//! Storefront API
//!
//! REST backend for a small storefront: catalog, orders, reviews,
//! banners and site settings over a document-style store.
//!
//! ## Features
//! - Order lifecycle with stock and sales reconciliation
//! - Unique, URL-safe product slugs
//! - Coupon validity and usage counting
//! - Purchase-gated product reviews
//! - Scheduled promotional banners

pub mod api;
pub mod config;
pub mod domain;
pub mod services;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Insufficient stock for {name}")]
    InsufficientStock {
        product_id: Uuid,
        name: String,
        requested: u32,
        available: u32,
    },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database connection not available. Please try again later.")]
    Unavailable,

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl EcommerceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), details: None }
    }

    pub fn not_authorized() -> Self {
        Self::Forbidden("Not authorized".to_string())
    }
}

impl From<StoreError> for EcommerceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => Self::Conflict(format!("{what} already exists")),
            other => Self::Storage(other),
        }
    }
}

impl From<validator::ValidationErrors> for EcommerceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation {
            message: "Validation failed".to_string(),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
