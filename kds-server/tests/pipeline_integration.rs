// kds-server/tests/pipeline_integration.rs
// 端到端管线集成测试: 接入 -> 广播 -> 流转 -> 轮询收敛

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tower::ServiceExt;

use kds_server::routes::build_app;
use kds_server::utils::AppError;
use kds_server::{Config, OrdersApi, ServerState};
use shared::message::{EventType, RoomId, StatusChangedPayload};
use shared::order::{DisplayOrder, OrderStatus, OrderType, PriorityLevel};

struct ScriptedOrdersApi {
    orders: Vec<DisplayOrder>,
    fail_persist: AtomicBool,
}

#[async_trait]
impl OrdersApi for ScriptedOrdersApi {
    async fn fetch_display_orders(
        &self,
        _display_id: &str,
        _tenant_id: &str,
    ) -> Result<Vec<DisplayOrder>, AppError> {
        Ok(self.orders.clone())
    }

    async fn persist_status(
        &self,
        _display_order_id: &str,
        _tenant_id: &str,
        _status: OrderStatus,
    ) -> Result<(), AppError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            Err(AppError::Persistence("orders api down".to_string()))
        } else {
            Ok(())
        }
    }
}

fn sample_order(id: &str) -> DisplayOrder {
    DisplayOrder {
        id: id.to_string(),
        order_id: format!("o-{id}"),
        order_number: "A-042".to_string(),
        customer_name: "Walk-in".to_string(),
        order_type: OrderType::DineIn,
        total_amount: Decimal::new(2450, 2),
        items: vec![],
        special_instructions: Some("no onions".to_string()),
        status: OrderStatus::New,
        priority_level: PriorityLevel::Normal,
        created_at: Utc::now(),
        acknowledged_at: None,
        estimated_ready_time: None,
    }
}

fn state_with(orders: Vec<DisplayOrder>) -> ServerState {
    let config = Config::with_overrides("http://localhost:0/api", 0, 0);
    ServerState::with_orders_api(
        &config,
        Arc::new(ScriptedOrdersApi {
            orders,
            fail_persist: AtomicBool::new(false),
        }),
    )
}

#[tokio::test]
async fn test_ingest_pushes_new_order_to_room() {
    let state = state_with(vec![]);
    let room = RoomId::new("t1", "disp1");
    let mut room_rx = state.hub.join(&room);

    let app = build_app(state.clone());
    let body = serde_json::json!({
        "tenantId": "t1",
        "order": serde_json::to_value(sample_order("d1")).unwrap(),
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/displays/disp1/orders")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The order landed in the snapshot and the push reached the room
    assert!(state.store.get(&room, "d1").is_some());
    let pushed = room_rx.recv().await.unwrap();
    assert_eq!(pushed.event_type, EventType::NewOrder);
}

#[tokio::test]
async fn test_transition_broadcasts_and_survives_poll() {
    let state = state_with(vec![sample_order("d1")]);
    let room = RoomId::new("t1", "disp1");
    let mut room_rx = state.hub.join(&room);

    // Poll the room in first
    state.refresh_room(&room).await.unwrap();
    let _display_update = room_rx.recv().await.unwrap();

    let app = build_app(state.clone());
    let body = serde_json::json!({
        "status": "preparing",
        "tenantId": "t1",
        "displayId": "disp1",
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/order-status/d1")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let pushed = room_rx.recv().await.unwrap();
    assert_eq!(pushed.event_type, EventType::OrderStatusUpdated);
    let payload: StatusChangedPayload = pushed.parse_payload().unwrap();
    assert_eq!(payload.new_status, OrderStatus::Preparing);

    let stored = state.store.get(&room, "d1").unwrap();
    assert_eq!(stored.status, OrderStatus::Preparing);
    assert!(stored.acknowledged_at.is_some());
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let state = state_with(vec![sample_order("d1")]);
    let room = RoomId::new("t1", "disp1");
    state.refresh_room(&room).await.unwrap();

    let app = build_app(state.clone());
    let body = serde_json::json!({
        "status": "completed",
        "tenantId": "t1",
        "displayId": "disp1",
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/order-status/d1")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Board untouched
    assert_eq!(
        state.store.get(&room, "d1").unwrap().status,
        OrderStatus::New
    );
}

#[tokio::test]
async fn test_stats_endpoint_reports_board_counts() {
    let mut aged = sample_order("d-old");
    aged.created_at = Utc::now() - chrono::Duration::minutes(35);
    let state = state_with(vec![sample_order("d-new"), aged]);

    let app = build_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/displays/disp1/stats?tenant=t1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["newCount"], 2);
    // The 35-minute order is past the critical threshold
    assert_eq!(body["data"]["urgentCount"], 1);
}
