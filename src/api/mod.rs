//! HTTP API
//!
//! Routes live under `/api`. Every route except `/api/health` first checks
//! that the store answers a ping and fails fast with 503 when it does not.

pub mod auth;
pub mod banners;
pub mod coupons;
pub mod error;
pub mod extract;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domain::events::EventPublisher;
use crate::domain::value_objects::Page;
use crate::services::{BannerService, CouponService, OrderService, ProductService, ReviewService, SettingsService};
use crate::store::Store;
use crate::EcommerceError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub orders: OrderService,
    pub products: ProductService,
    pub reviews: ReviewService,
    pub banners: BannerService,
    pub settings: SettingsService,
    pub coupons: CouponService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self {
        Self {
            orders: OrderService::new(store.clone(), events.clone()),
            products: ProductService::new(store.clone(), events),
            reviews: ReviewService::new(store.clone()),
            banners: BannerService::new(store.clone()),
            settings: SettingsService::new(store.clone()),
            coupons: CouponService::new(store.clone()),
            store,
        }
    }
}

pub fn router(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/products", get(products::list).post(products::create))
        .route("/products/:id", get(products::get).put(products::update).delete(products::delete))
        .route("/products/:id/featured", patch(products::toggle_featured))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/:id", get(orders::get))
        .route("/orders/:id/status", put(orders::set_status))
        .route("/orders/:id/cancel", put(orders::cancel))
        .route("/orders/:id/tracking", put(orders::update_tracking))
        .route("/coupons", post(coupons::create))
        .route("/coupons/validate", get(coupons::validate))
        .route("/reviews", post(reviews::create))
        .route("/reviews/product/:product_id", get(reviews::list))
        .route("/reviews/product/:product_id/eligibility", get(reviews::eligibility))
        .route("/reviews/:id/helpful", put(reviews::helpful))
        .route("/banners", get(banners::active).post(banners::create))
        .route("/banners/all", get(banners::all))
        .route("/banners/:id", get(banners::get).put(banners::update).delete(banners::delete))
        .route("/banners/:id/toggle", patch(banners::toggle))
        .route("/settings", get(settings::get).put(settings::update))
        .route("/settings/public", get(settings::public))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_store))
        .route("/health", get(health));

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors(config))
        .with_state(state)
}

fn cors(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(auth::USER_ID_HEADER),
            HeaderName::from_static(auth::USER_ROLE_HEADER),
        ])
        .allow_credentials(true)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "Server is running" }))
}

async fn require_store(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Err(e) = state.store.ping().await {
        tracing::error!(error = %e, path = %request.uri().path(), "store unavailable");
        return EcommerceError::Unavailable.into_response();
    }
    next.run(request).await
}

/// Paginated list envelope: `count`, `total`, `totalPages`, `currentPage`
/// and the items under `key`.
pub(crate) fn listing<T: Serialize>(key: &str, page: Page<T>) -> Json<Value> {
    let mut body = json!({
        "success": true,
        "count": page.items.len(),
        "total": page.total,
        "totalPages": page.total_pages(),
        "currentPage": page.page,
    });
    body[key] = json!(page.items);
    Json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Actor, Role};
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), EventPublisher::disabled());
        (router(state, &Config::default()), store)
    }

    fn req(method: Method, uri: &str, actor: Option<&Actor>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder
                .header(auth::USER_ID_HEADER, actor.id.to_string())
                .header(auth::USER_ROLE_HEADER, format!("{:?}", actor.role).to_lowercase());
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_bypasses_store_check() {
        let (app, store) = app();
        store.set_offline(true);
        let (status, body) = call(&app, req(Method::GET, "/api/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");

        let (status, body) = call(&app, req(Method::GET, "/api/products", None, None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "DB_CONNECTION_ERROR");
    }

    #[tokio::test]
    async fn test_order_flow_over_http() {
        let (app, _) = app();
        let editor = Actor::new(Uuid::now_v7(), Role::Editor);
        let customer = Actor::new(Uuid::now_v7(), Role::Customer);

        let (status, body) = call(
            &app,
            req(
                Method::POST,
                "/api/products",
                Some(&editor),
                Some(json!({
                    "name": "Desk Lamp",
                    "description": "Warm light",
                    "price": 40,
                    "category": Uuid::nil(),
                    "inventory": { "stock": 3 }
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["product"]["slug"], "desk-lamp");
        assert_eq!(body["product"]["isLowStock"], true);
        let product_id = body["product"]["id"].as_str().unwrap().to_string();

        let order_body = |quantity: u32| {
            json!({
                "items": [{ "product": product_id, "quantity": quantity }],
                "shippingAddress": { "name": "Ada Lovelace", "city": "London" },
                "payment": { "method": "cod" }
            })
        };
        let (status, body) = call(&app, req(Method::POST, "/api/orders", Some(&customer), Some(order_body(5)))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["available"], 3);

        let (status, body) = call(&app, req(Method::POST, "/api/orders", Some(&customer), Some(order_body(2)))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["order"]["status"], "pending");
        let order_id = body["order"]["id"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            req(Method::PUT, &format!("/api/orders/{order_id}/status"), Some(&customer), Some(json!({ "status": "shipped" }))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, req(Method::PUT, &format!("/api/orders/{order_id}/cancel"), Some(&customer), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["status"], "cancelled");

        let (_, body) = call(&app, req(Method::GET, &format!("/api/products/{product_id}"), None, None)).await;
        assert_eq!(body["product"]["inventory"]["stock"], 3);
        assert_eq!(body["product"]["sales"], 0);

        let (status, body) = call(&app, req(Method::GET, "/api/orders", Some(&customer), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["currentPage"], 1);
    }

    #[tokio::test]
    async fn test_rejections_use_the_envelope() {
        let (app, _) = app();
        let (status, body) = call(&app, req(Method::GET, "/api/orders", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, body) = call(&app, req(Method::GET, "/api/products/not-a-uuid", None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let admin = Actor::new(Uuid::now_v7(), Role::Admin);
        let (status, _) = call(&app, req(Method::POST, "/api/orders", Some(&admin), Some(json!({ "items": "nope" })))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, req(Method::GET, &format!("/api/orders/{}", Uuid::now_v7()), Some(&admin), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");
    }

    #[tokio::test]
    async fn test_public_settings_banners_and_coupons() {
        let (app, _) = app();
        let (status, body) = call(&app, req(Method::GET, "/api/settings/public", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["settings"]["tax"]["enabled"], true);

        let admin = Actor::new(Uuid::now_v7(), Role::Admin);
        let (status, _) = call(
            &app,
            req(Method::POST, "/api/banners", Some(&admin), Some(json!({ "image": "https://cdn.example.com/a.jpg" }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, body) = call(&app, req(Method::GET, "/api/banners", None, None)).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["banners"][0]["buttonText"], "Shop Now");

        let (status, body) = call(&app, req(Method::GET, "/api/coupons/validate?code=none&amount=10", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
    }
}
