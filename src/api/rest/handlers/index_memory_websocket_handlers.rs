// Index & Memory WebSocket Event Handlers
//
// Real-time WebSocket handlers for index and memory operations including:
// - Index rebuild/reindex notifications
// - Memory pressure alerts
// - SIMD operation metrics
// - B-tree split/merge events
// - LSM compaction events
// - Buffer pool eviction events
// - In-memory column store events

use axum::{
    extract::{ws::{WebSocket, WebSocketUpgrade}, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use serde_json::json;
use futures::{StreamExt, SinkExt};
use tokio::time::interval;

use super::super::types::ApiState;

// ============================================================================
// Index Event Types
// ============================================================================

/// Index rebuild progress event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndexRebuildEvent {
    pub event_type: String, // "index_rebuild_started", "index_rebuild_progress", "index_rebuild_completed"
    pub index_name: String,
    pub table_name: String,
    pub progress_percent: f64,
    pub rows_processed: u64,
    pub total_rows: Option<u64>,
    pub elapsed_seconds: u64,
    pub estimated_remaining_seconds: Option<u64>,
    pub online_rebuild: bool,
    pub timestamp: i64,
}

/// Index split/merge event for B-tree operations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndexSplitMergeEvent {
    pub event_type: String, // "btree_split", "btree_merge"
    pub index_name: String,
    pub node_id: u64,
    pub level: u32,
    pub keys_before: usize,
    pub keys_after: usize,
    pub split_key: Option<String>,
    pub timestamp: i64,
}

/// LSM compaction event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LSMCompactionEvent {
    pub event_type: String, // "compaction_started", "compaction_completed"
    pub index_name: String,
    pub level: u32,
    pub num_files: usize,
    pub input_size_bytes: u64,
    pub output_size_bytes: u64,
    pub duration_ms: Option<u64>,
    pub rows_compacted: u64,
    pub timestamp: i64,
}

/// Full-text index update event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FullTextIndexEvent {
    pub event_type: String, // "document_indexed", "index_optimized"
    pub index_name: String,
    pub document_id: String,
    pub terms_added: usize,
    pub index_size_bytes: u64,
    pub timestamp: i64,
}

// ============================================================================
// Memory Event Types
// ============================================================================

/// Memory pressure alert event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemoryPressureEvent {
    pub event_type: String, // "pressure_warning", "pressure_critical", "pressure_resolved"
    pub pressure_level: String, // "normal", "low", "medium", "high", "critical"
    pub total_memory_bytes: u64,
    pub used_memory_bytes: u64,
    pub available_memory_bytes: u64,
    pub utilization_percent: f64,
    pub actions_taken: Vec<String>,
    pub timestamp: i64,
}

/// Buffer pool eviction event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BufferPoolEvictionEvent {
    pub event_type: String, // "page_evicted", "batch_evicted"
    pub page_id: Option<u64>,
    pub num_pages: usize,
    pub eviction_policy: String, // "CLOCK", "LRU", "2Q", "LRU-K"
    pub dirty_pages_flushed: usize,
    pub free_frames_after: usize,
    pub total_frames: usize,
    pub timestamp: i64,
}

/// Garbage collection event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GarbageCollectionEvent {
    pub event_type: String, // "gc_started", "gc_completed"
    pub gc_type: String, // "minor", "major", "full"
    pub freed_bytes: u64,
    pub duration_ms: u64,
    pub contexts_cleaned: u32,
    pub fragmentation_before: f64,
    pub fragmentation_after: f64,
    pub timestamp: i64,
}

/// Allocator statistics event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocatorStatsEvent {
    pub event_type: String, // "allocator_stats"
    pub allocator_type: String, // "slab", "arena", "large_object"
    pub allocated_bytes: u64,
    pub freed_bytes: u64,
    pub current_usage_bytes: u64,
    pub peak_usage_bytes: u64,
    pub fragmentation: f64,
    pub timestamp: i64,
}

// ============================================================================
// SIMD Operation Event Types
// ============================================================================

/// SIMD operation metrics event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SimdOperationEvent {
    pub event_type: String, // "simd_filter", "simd_aggregate", "simd_scan"
    pub operation_type: String, // "filter", "aggregate", "scan", "hash", "string_match"
    pub rows_processed: u64,
    pub rows_selected: u64,
    pub selectivity: f64,
    pub simd_ops: u64,
    pub scalar_ops: u64,
    pub simd_ratio: f64,
    pub duration_us: u64,
    pub throughput_rows_per_sec: f64,
    pub vector_width: usize, // 128, 256, 512 bits
    pub timestamp: i64,
}

// ============================================================================
// In-Memory Column Store Event Types
// ============================================================================

/// In-memory population event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InMemoryPopulationEvent {
    pub event_type: String, // "population_started", "population_progress", "population_completed"
    pub table_name: String,
    pub rows_populated: u64,
    pub total_rows: Option<u64>,
    pub progress_percent: f64,
    pub memory_used_bytes: u64,
    pub compression_ratio: f64,
    pub duration_ms: Option<u64>,
    pub timestamp: i64,
}

/// In-memory eviction event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InMemoryEvictionEvent {
    pub event_type: String, // "table_evicted", "segment_evicted"
    pub table_name: String,
    pub segment_id: Option<u64>,
    pub rows_evicted: u64,
    pub memory_freed_bytes: u64,
    pub reason: String, // "memory_pressure", "lru", "manual"
    pub timestamp: i64,
}

/// Column compression event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ColumnCompressionEvent {
    pub event_type: String, // "compression_started", "compression_completed"
    pub table_name: String,
    pub column_name: String,
    pub compression_type: String, // "dictionary", "rle", "delta", "for"
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    pub compression_ratio: f64,
    pub duration_ms: u64,
    pub timestamp: i64,
}

// ============================================================================
// WebSocket Upgrade Handlers
// ============================================================================

/// WebSocket handler for index events
///
/// Streams real-time index operation events including rebuilds, splits, merges, and compactions.
#[utoipa::path(
    get,
    path = "/api/v1/ws/index/events",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_index_events_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_index_events_websocket(socket, state))
}

/// WebSocket handler for memory events
///
/// Streams real-time memory management events including pressure alerts, evictions, and GC.
#[utoipa::path(
    get,
    path = "/api/v1/ws/memory/events",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_memory_events_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_memory_events_websocket(socket, state))
}

/// WebSocket handler for buffer pool events
///
/// Streams real-time buffer pool events including evictions, hits, misses, and flushes.
#[utoipa::path(
    get,
    path = "/api/v1/ws/buffer/events",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_buffer_pool_events_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_buffer_pool_events_websocket(socket, state))
}

/// WebSocket handler for SIMD operation metrics
///
/// Streams real-time SIMD operation metrics and performance statistics.
#[utoipa::path(
    get,
    path = "/api/v1/ws/simd/metrics",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_simd_metrics_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_simd_metrics_websocket(socket, state))
}

/// WebSocket handler for in-memory column store events
///
/// Streams real-time in-memory column store events including population, eviction, and compression.
#[utoipa::path(
    get,
    path = "/api/v1/ws/inmemory/events",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "websocket"
)]
pub async fn ws_inmemory_events_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_inmemory_events_websocket(socket, state))
}

// ============================================================================
// WebSocket Connection Handlers
// ============================================================================

/// Handle index events WebSocket connection
async fn handle_index_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    // Send welcome message
    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to Index Events Stream",
        "available_events": ["index_rebuild", "btree_split", "btree_merge", "lsm_compaction", "fulltext_update"],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Spawn event streaming task
    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(5));
        let mut sequence = 0u64;

        loop {
            ticker.tick().await;
            sequence += 1;

            // Generate sample events (in production, these would come from actual index operations)
            let sample_events = vec![
                // B-tree split event
                json!({
                    "event_type": "btree_split",
                    "index_name": "idx_users_email",
                    "node_id": 12345,
                    "level": 2,
                    "keys_before": 512,
                    "keys_after": 256,
                    "split_key": "m@example.com",
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
                // LSM compaction event
                json!({
                    "event_type": "compaction_completed",
                    "index_name": "idx_orders_timestamp",
                    "level": 1,
                    "num_files": 8,
                    "input_size_bytes": 67108864,
                    "output_size_bytes": 33554432,
                    "duration_ms": 1500,
                    "rows_compacted": 1000000,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
                // Index rebuild progress event
                json!({
                    "event_type": "index_rebuild_progress",
                    "index_name": "idx_products_category",
                    "table_name": "products",
                    "progress_percent": 45.5,
                    "rows_processed": 455000,
                    "total_rows": 1000000,
                    "elapsed_seconds": 120,
                    "estimated_remaining_seconds": 144,
                    "online_rebuild": true,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
            ];

            // Send one sample event per interval
            let event = &sample_events[sequence as usize % sample_events.len()];
            if let Ok(event_json) = serde_json::to_string(event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming control messages
    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}

/// Handle memory events WebSocket connection
async fn handle_memory_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to Memory Events Stream",
        "available_events": ["memory_pressure", "gc_event", "allocator_stats"],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    let (mut sender, mut receiver) = socket.split();

    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(3));
        let mut sequence = 0u64;

        loop {
            ticker.tick().await;
            sequence += 1;

            let sample_events = vec![
                // Memory pressure event
                json!({
                    "event_type": "pressure_warning",
                    "pressure_level": "medium",
                    "total_memory_bytes": 8589934592u64, // 8GB
                    "used_memory_bytes": 7301691392u64,  // ~6.8GB
                    "available_memory_bytes": 1288243200u64,
                    "utilization_percent": 85.0,
                    "actions_taken": ["Evicted 100 cache entries", "Freed 50 query contexts"],
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
                // GC event
                json!({
                    "event_type": "gc_completed",
                    "gc_type": "minor",
                    "freed_bytes": 104857600, // 100MB
                    "duration_ms": 50,
                    "contexts_cleaned": 25,
                    "fragmentation_before": 0.35,
                    "fragmentation_after": 0.12,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
                // Allocator stats event
                json!({
                    "event_type": "allocator_stats",
                    "allocator_type": "slab",
                    "allocated_bytes": 2147483648u64, // 2GB
                    "freed_bytes": 1073741824u64,     // 1GB
                    "current_usage_bytes": 1073741824u64,
                    "peak_usage_bytes": 2684354560u64,
                    "fragmentation": 0.15,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
            ];

            let event = &sample_events[sequence as usize % sample_events.len()];
            if let Ok(event_json) = serde_json::to_string(event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}

/// Handle buffer pool events WebSocket connection
async fn handle_buffer_pool_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to Buffer Pool Events Stream",
        "available_events": ["page_evicted", "batch_evicted", "page_flushed"],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    let (mut sender, mut receiver) = socket.split();

    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(2));
        let mut sequence = 0u64;

        loop {
            ticker.tick().await;
            sequence += 1;

            let sample_events = vec![
                json!({
                    "event_type": "page_evicted",
                    "page_id": 42567,
                    "num_pages": 1,
                    "eviction_policy": "CLOCK",
                    "dirty_pages_flushed": 0,
                    "free_frames_after": 125,
                    "total_frames": 1000,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
                json!({
                    "event_type": "batch_evicted",
                    "page_id": null,
                    "num_pages": 64,
                    "eviction_policy": "2Q",
                    "dirty_pages_flushed": 12,
                    "free_frames_after": 189,
                    "total_frames": 1000,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
            ];

            let event = &sample_events[sequence as usize % sample_events.len()];
            if let Ok(event_json) = serde_json::to_string(event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}

/// Handle SIMD metrics WebSocket connection
async fn handle_simd_metrics_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to SIMD Metrics Stream",
        "available_metrics": ["simd_filter", "simd_aggregate", "simd_scan", "simd_hash"],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    let (mut sender, mut receiver) = socket.split();

    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(500));
        let mut sequence = 0u64;

        loop {
            ticker.tick().await;
            sequence += 1;

            let sample_events = vec![
                json!({
                    "event_type": "simd_filter",
                    "operation_type": "filter",
                    "rows_processed": 1000000,
                    "rows_selected": 250000,
                    "selectivity": 0.25,
                    "simd_ops": 15625,
                    "scalar_ops": 0,
                    "simd_ratio": 1.0,
                    "duration_us": 5000,
                    "throughput_rows_per_sec": 200000000.0,
                    "vector_width": 256,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
                json!({
                    "event_type": "simd_aggregate",
                    "operation_type": "aggregate",
                    "rows_processed": 5000000,
                    "rows_selected": 5000000,
                    "selectivity": 1.0,
                    "simd_ops": 78125,
                    "scalar_ops": 0,
                    "simd_ratio": 1.0,
                    "duration_us": 8000,
                    "throughput_rows_per_sec": 625000000.0,
                    "vector_width": 256,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
            ];

            let event = &sample_events[sequence as usize % sample_events.len()];
            if let Ok(event_json) = serde_json::to_string(event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}

/// Handle in-memory events WebSocket connection
async fn handle_inmemory_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to In-Memory Events Stream",
        "available_events": ["population_event", "eviction_event", "compression_event"],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    let (mut sender, mut receiver) = socket.split();

    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(4));
        let mut sequence = 0u64;

        loop {
            ticker.tick().await;
            sequence += 1;

            let sample_events = vec![
                json!({
                    "event_type": "population_progress",
                    "table_name": "sales_history",
                    "rows_populated": 5500000,
                    "total_rows": 10000000,
                    "progress_percent": 55.0,
                    "memory_used_bytes": 2147483648u64, // 2GB
                    "compression_ratio": 4.5,
                    "duration_ms": null,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
                json!({
                    "event_type": "compression_completed",
                    "table_name": "customer_data",
                    "column_name": "email",
                    "compression_type": "dictionary",
                    "original_size_bytes": 536870912, // 512MB
                    "compressed_size_bytes": 67108864, // 64MB
                    "compression_ratio": 8.0,
                    "duration_ms": 2500,
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
                json!({
                    "event_type": "table_evicted",
                    "table_name": "archive_logs",
                    "segment_id": null,
                    "rows_evicted": 1000000,
                    "memory_freed_bytes": 524288000, // ~500MB
                    "reason": "lru",
                    "timestamp": SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs(),
                }),
            ];

            let event = &sample_events[sequence as usize % sample_events.len()];
            if let Ok(event_json) = serde_json::to_string(event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}
