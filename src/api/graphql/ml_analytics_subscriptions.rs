// GraphQL Subscriptions for ML and Analytics
//
// Provides real-time GraphQL subscriptions for:
// - ML model training progress
// - Analytics query results
// - Graph algorithm progress
// - Document store changes
// - Spatial query updates

use async_graphql::{Object, Subscription, Schema, EmptyMutation, SimpleObject};
use futures_util::stream::{Stream};

use tokio::time::{interval, Duration};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

// ============================================================================
// GraphQL Types - ML Operations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct MLTrainingProgress {
    pub model_id: String,
    pub model_name: String,
    pub epoch: i32,
    pub total_epochs: i32,
    pub loss: f64,
    pub accuracy: Option<f64>,
    pub validation_loss: Option<f64>,
    pub validation_accuracy: Option<f64>,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct MLPredictionEvent {
    pub model_id: String,
    pub prediction_id: String,
    pub value: f64,
    pub confidence: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct MLModelLifecycleEvent {
    pub event_type: String,
    pub model_id: String,
    pub model_name: String,
    pub version: Option<String>,
    pub timestamp: String,
}

// ============================================================================
// GraphQL Types - Analytics Operations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct AnalyticsQueryProgress {
    pub query_id: String,
    pub operation: String,
    pub progress_pct: f64,
    pub rows_processed: i32,
    pub estimated_total_rows: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct TimeSeriesAnomalyAlert {
    pub metric_name: String,
    pub timestamp: String,
    pub value: f64,
    pub expected_value: f64,
    pub severity: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct WorkloadRecommendation {
    pub recommendation_type: String,
    pub target: String,
    pub reason: String,
    pub estimated_improvement_pct: f64,
    pub priority: String,
}

// ============================================================================
// GraphQL Types - Graph Operations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct GraphAlgorithmProgress {
    pub graph_id: String,
    pub algorithm: String,
    pub iteration: i32,
    pub total_iterations: Option<i32>,
    pub converged: bool,
    pub vertices_processed: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct GraphTraversalUpdate {
    pub traversal_id: String,
    pub current_vertex: String,
    pub depth: i32,
    pub vertices_visited: i32,
    pub matches_found: i32,
}

// ============================================================================
// GraphQL Types - Document Store
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct DocumentChangeEvent {
    pub operation_type: String,
    pub collection: String,
    pub document_id: String,
    pub timestamp: String,
}

// ============================================================================
// GraphQL Types - Spatial Operations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct SpatialQueryUpdate {
    pub query_id: String,
    pub results_found: i32,
    pub processing_complete: bool,
}

// ============================================================================
// GraphQL Subscription Root
// ============================================================================

pub struct MLAnalyticsSubscription;

#[Subscription]
impl MLAnalyticsSubscription {
    /// Subscribe to ML model training progress
    ///
    /// Receives real-time updates during model training including epoch progress,
    /// loss values, and accuracy metrics.
    ///
    /// # Arguments
    /// * `model_id` - Optional filter for specific model
    async fn ml_training_progress(
        &self,
        model_id: Option<String>,
    ) -> Pin<Box<dyn Stream<Item = MLTrainingProgress> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_secs(1));
            let mut epoch = 1;
            let total_epochs = 100;
            let model_id = model_id.unwrap_or_else(|| "model_default".to_string());

            while epoch <= total_epochs {
                ticker.tick().await;

                let progress = MLTrainingProgress {
                    model_id: model_id.clone(),
                    model_name: "example_model".to_string(),
                    epoch,
                    total_epochs,
                    loss: 1.0 / (epoch as f64 + 1.0),
                    accuracy: Some(1.0 - 1.0 / (epoch as f64 + 1.0)),
                    validation_loss: Some(1.2 / (epoch as f64 + 1.0)),
                    validation_accuracy: Some(1.0 - 1.2 / (epoch as f64 + 1.0)),
                    elapsed_seconds: epoch as f64 * 0.5,
                };

                yield progress;
                epoch += 1;
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to ML predictions
    ///
    /// Streams predictions as they are generated, useful for batch prediction monitoring.
    async fn ml_predictions(
        &self,
        model_id: String,
    ) -> Pin<Box<dyn Stream<Item = MLPredictionEvent> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_millis(500));
            let mut count = 0;

            loop {
                ticker.tick().await;

                let prediction = MLPredictionEvent {
                    model_id: model_id.clone(),
                    prediction_id: format!("pred_{}", count),
                    value: 0.5 + (count as f64 * 0.1) % 0.5,
                    confidence: 0.85 + (count as f64 * 0.01) % 0.15,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };

                yield prediction;
                count += 1;

                if count >= 100 {
                    break;
                }
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to model lifecycle events
    ///
    /// Receives notifications when models are created, updated, deployed, or deleted.
    async fn ml_model_lifecycle(
        &self,
    ) -> Pin<Box<dyn Stream<Item = MLModelLifecycleEvent> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_secs(5));
            let event_types = vec!["created", "updated", "deployed", "deprecated"];
            let mut idx = 0;

            loop {
                ticker.tick().await;

                let event = MLModelLifecycleEvent {
                    event_type: event_types[idx % event_types.len()].to_string(),
                    model_id: format!("model_{}", idx),
                    model_name: format!("prediction_model_{}", idx),
                    version: Some(format!("v1.{}", idx)),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };

                yield event;
                idx += 1;
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to analytics query progress
    ///
    /// Monitors long-running analytical queries with progress updates.
    async fn analytics_query_progress(
        &self,
        query_id: String,
    ) -> Pin<Box<dyn Stream<Item = AnalyticsQueryProgress> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_millis(500));
            let total_rows = 1000000;
            let mut rows_processed = 0;

            while rows_processed < total_rows {
                ticker.tick().await;

                rows_processed += 10000;

                let progress = AnalyticsQueryProgress {
                    query_id: query_id.clone(),
                    operation: "olap_aggregation".to_string(),
                    progress_pct: (rows_processed as f64 / total_rows as f64) * 100.0,
                    rows_processed,
                    estimated_total_rows: Some(total_rows),
                };

                yield progress;
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to time series anomaly alerts
    ///
    /// Real-time alerts when anomalies are detected in time series data.
    async fn timeseries_anomaly_alerts(
        &self,
        metric_name: Option<String>,
    ) -> Pin<Box<dyn Stream<Item = TimeSeriesAnomalyAlert> + Send + 'static>> {
        let metric_name = metric_name.unwrap_or_else(|| "system.cpu".to_string());

        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_secs(10));

            loop {
                ticker.tick().await;

                // Simulate occasional anomaly detection
                if rand::random::<f64>() < 0.3 {
                    let alert = TimeSeriesAnomalyAlert {
                        metric_name: metric_name.clone(),
                        timestamp: chrono::Utc::now().to_rfc3339(),
                        value: 95.0,
                        expected_value: 60.0,
                        severity: "high".to_string(),
                        confidence: 0.92,
                    };

                    yield alert;
                }
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to workload analysis recommendations
    ///
    /// Receives optimization recommendations based on workload analysis.
    async fn workload_recommendations(
        &self,
    ) -> Pin<Box<dyn Stream<Item = WorkloadRecommendation> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_secs(30));

            loop {
                ticker.tick().await;

                let recommendation = WorkloadRecommendation {
                    recommendation_type: "index".to_string(),
                    target: "users(email)".to_string(),
                    reason: "Frequent filtering detected on email column".to_string(),
                    estimated_improvement_pct: 45.0,
                    priority: "high".to_string(),
                };

                yield recommendation;
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to graph algorithm progress
    ///
    /// Monitors graph algorithm execution with iteration updates.
    async fn graph_algorithm_progress(
        &self,
        graph_id: String,
        algorithm: String,
    ) -> Pin<Box<dyn Stream<Item = GraphAlgorithmProgress> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_millis(200));
            let total_iterations = 50;
            let mut iteration = 1;

            while iteration <= total_iterations {
                ticker.tick().await;

                let progress = GraphAlgorithmProgress {
                    graph_id: graph_id.clone(),
                    algorithm: algorithm.clone(),
                    iteration,
                    total_iterations: Some(total_iterations),
                    converged: iteration == total_iterations,
                    vertices_processed: iteration * 20,
                };

                yield progress;
                iteration += 1;
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to graph traversal updates
    ///
    /// Real-time updates during graph traversal operations.
    async fn graph_traversal(
        &self,
        traversal_id: String,
    ) -> Pin<Box<dyn Stream<Item = GraphTraversalUpdate> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_millis(300));
            let max_depth = 5;
            let mut depth = 0;

            while depth <= max_depth {
                ticker.tick().await;

                let update = GraphTraversalUpdate {
                    traversal_id: traversal_id.clone(),
                    current_vertex: format!("v{}", depth * 2 + 1),
                    depth,
                    vertices_visited: (depth + 1) * 3,
                    matches_found: depth,
                };

                yield update;
                depth += 1;
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to document change events
    ///
    /// MongoDB-like change streams for document collections.
    async fn document_changes(
        &self,
        collection: String,
        operation_types: Option<Vec<String>>,
    ) -> Pin<Box<dyn Stream<Item = DocumentChangeEvent> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_secs(3));
            let operations = vec!["insert", "update", "delete", "replace"];
            let mut idx = 0;

            loop {
                ticker.tick().await;

                let op_type = operations[idx % operations.len()].to_string();

                // Filter by operation types if specified
                if let Some(ref filter_ops) = operation_types {
                    if !filter_ops.contains(&op_type) {
                        idx += 1;
                        continue;
                    }
                }

                let event = DocumentChangeEvent {
                    operation_type: op_type,
                    collection: collection.clone(),
                    document_id: format!("doc_{}", idx),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };

                yield event;
                idx += 1;
            }
        };

        Box::pin(stream)
    }

    /// Subscribe to spatial query updates
    ///
    /// Progress updates for spatial queries and operations.
    async fn spatial_query_progress(
        &self,
        query_id: String,
    ) -> Pin<Box<dyn Stream<Item = SpatialQueryUpdate> + Send + 'static>> {
        let stream = async_stream::stream! {
            let mut ticker = interval(Duration::from_millis(500));
            let mut results_found = 0;
            let total_results = 20;

            while results_found < total_results {
                ticker.tick().await;

                results_found += 2;

                let update = SpatialQueryUpdate {
                    query_id: query_id.clone(),
                    results_found,
                    processing_complete: results_found >= total_results,
                };

                yield update;
            }
        };

        Box::pin(stream)
    }
}

// ============================================================================
// Example Schema Builder
// ============================================================================

pub type MLAnalyticsSchema = Schema<EmptyQuery, EmptyMutation, MLAnalyticsSubscription>;

pub struct EmptyQuery;

#[Object]
impl EmptyQuery {
    /// Placeholder query (GraphQL requires at least one query)
    async fn version(&self) -> String {
        "1.0.0".to_string()
    }
}

/// Build the ML/Analytics GraphQL schema
pub fn build_ml_analytics_schema() -> MLAnalyticsSchema {
    Schema::build(EmptyQuery, EmptyMutation, MLAnalyticsSubscription)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_creation() {
        let schema = build_ml_analytics_schema();
        assert!(!schema.sdl().is_empty());
    }
}
