//! Error → HTTP response mapping
//!
//! Every failure renders as `{"success": false, "message": ...}` plus
//! `details` for validation and stock errors.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::EcommerceError;

impl EcommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation { .. } | Self::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({ "success": false, "message": self.to_string() });
        match &self {
            Self::Validation { details: Some(details), .. } => body["details"] = details.clone(),
            Self::InsufficientStock { product_id, name, requested, available } => {
                body["details"] = json!({
                    "product": product_id,
                    "name": name,
                    "requested": requested,
                    "available": available,
                });
            }
            Self::Unavailable => body["code"] = Value::from("DB_CONNECTION_ERROR"),
            Self::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                body["message"] = Value::from("Internal server error");
            }
            _ => {}
        }
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for EcommerceError {
    fn from(rejection: JsonRejection) -> Self { Self::validation(rejection.body_text()) }
}

impl From<PathRejection> for EcommerceError {
    fn from(rejection: PathRejection) -> Self { Self::validation(rejection.body_text()) }
}

impl From<QueryRejection> for EcommerceError {
    fn from(rejection: QueryRejection) -> Self { Self::validation(rejection.body_text()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use uuid::Uuid;

    async fn body(err: EcommerceError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_envelopes() {
        let (status, json) = body(EcommerceError::NotFound("Order not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "success": false, "message": "Order not found" }));

        let (status, json) = body(EcommerceError::InsufficientStock {
            product_id: Uuid::nil(),
            name: "Lamp".into(),
            requested: 3,
            available: 1,
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Insufficient stock for Lamp");
        assert_eq!(json["details"]["available"], 1);

        let (status, json) = body(EcommerceError::Storage(StoreError::Backend("password=hunter2".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Internal server error");

        let (status, json) = body(EcommerceError::Unavailable).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["code"], "DB_CONNECTION_ERROR");
    }
}
