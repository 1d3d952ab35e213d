use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api::{display_orders, health, order_status};
use crate::core::ServerState;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Display board API
        .merge(display_orders::router())
        // Status transition API
        .merge(order_status::router())
        // Health API - public route
        .merge(health::router())
}

/// Build a fully configured application with all middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::orders::OrdersApi;
    use crate::utils::AppError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use shared::order::{DisplayOrder, OrderStatus};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EmptyOrdersApi;

    #[async_trait]
    impl OrdersApi for EmptyOrdersApi {
        async fn fetch_display_orders(
            &self,
            _display_id: &str,
            _tenant_id: &str,
        ) -> Result<Vec<DisplayOrder>, AppError> {
            Ok(vec![])
        }

        async fn persist_status(
            &self,
            _display_order_id: &str,
            _tenant_id: &str,
            _status: OrderStatus,
        ) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn test_state() -> ServerState {
        let config = Config::with_overrides("http://localhost:0/api", 0, 0);
        ServerState::with_orders_api(&config, Arc::new(EmptyOrdersApi))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_display_orders_endpoint_serves_empty_board() {
        let app = build_app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/displays/disp1/orders?tenant=t1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_order_transition_is_not_found() {
        let app = build_app(test_state());
        let body = serde_json::json!({
            "status": "preparing",
            "tenantId": "t1",
            "displayId": "disp1",
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/order-status/ghost")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
