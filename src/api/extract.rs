//! Extractors whose rejections render through [`EcommerceError`].

use axum::extract::{FromRequest, FromRequestParts};

use crate::EcommerceError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(EcommerceError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(EcommerceError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(EcommerceError))]
pub struct ApiQuery<T>(pub T);
