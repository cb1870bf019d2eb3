// GraphQL Engine Implementation
//
// Core GraphQL engine that interfaces with the database

use async_graphql::{Context, Error, Result as GqlResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::DbError;
use super::types::*;
use super::models::*;

// ============================================================================
// GRAPHQL ENGINE - Core Implementation
// ============================================================================

/// Main GraphQL engine that interfaces with the database
pub struct GraphQLEngine {
    // Would connect to actual database components
    subscription_manager: Arc<SubscriptionManager>,
    query_cache: Arc<QueryCache>,
    rate_limiter: Arc<RateLimiter>,
    persisted_queries: Arc<PersistedQueries>,
}

impl GraphQLEngine {
    pub fn new() -> Self {
        Self {
            subscription_manager: Arc::new(SubscriptionManager::new()),
            query_cache: Arc::new(QueryCache::new(1000, 300)),
            rate_limiter: Arc::new(RateLimiter::new()),
            persisted_queries: Arc::new(PersistedQueries::new()),
        }
    }

    // Schema operations
    pub async fn get_schemas(&self) -> GqlResult<Vec<DatabaseSchema>> {
        // Mock implementation - would query actual catalog
        Ok(vec![DatabaseSchema {
            name: "public".to_string(),
            tables: vec![],
            table_count: 0,
            created_at: DateTime::now(),
            description: Some("Default schema".to_string()),
        }])
    }

    pub async fn get_schema(&self, name: &str) -> GqlResult<Option<DatabaseSchema>> {
        let schemas = self.get_schemas().await?;
        Ok(schemas.into_iter().find(|s| s.name == name))
    }

    // Table operations
    pub async fn get_tables(
        &self,
        _schema: Option<String>,
        _limit: Option<i32>,
        _offset: Option<i32>,
    ) -> GqlResult<Vec<TableType>> {
        // Mock implementation
        Ok(vec![])
    }

    pub async fn get_table(&self, _name: &str, _schema: Option<String>) -> GqlResult<Option<TableType>> {
        // Mock implementation
        Ok(None)
    }

    pub async fn get_table_statistics(&self, _table: &str) -> GqlResult<TableStatistics> {
        Ok(TableStatistics {
            row_count: BigInt(0),
            size_bytes: BigInt(0),
            index_size_bytes: BigInt(0),
            avg_row_size: 0.0,
            last_analyzed: None,
            last_modified: None,
        })
    }

    pub async fn get_sample_rows(&self, _table: &str, _limit: i32) -> GqlResult<Vec<RowType>> {
        Ok(vec![])
    }

    pub async fn get_column_statistics(&self, _table: &str, _column: &str) -> GqlResult<ColumnStatistics> {
        Ok(ColumnStatistics {
            distinct_count: BigInt(0),
            null_count: BigInt(0),
            avg_length: None,
            min_value: None,
            max_value: None,
            histogram: None,
        })
    }

    // Query operations
    pub async fn query_table(
        &self,
        _table: &str,
        _where_clause: Option<WhereClause>,
        _order_by: Option<Vec<OrderBy>>,
        _limit: Option<i32>,
        _offset: Option<i32>,
    ) -> Result<(Vec<RowType>, i64, bool)> {
        Ok((vec![], 0, false))
    }

    pub async fn query_tables(
        &self,
        _tables: Vec<String>,
        _joins: Option<Vec<JoinInput>>,
        _where_clause: Option<WhereClause>,
        _order_by: Option<Vec<OrderBy>>,
        _limit: Option<i32>,
    ) -> Result<(Vec<RowType>, i64, bool)> {
        Ok((vec![], 0, false))
    }

    pub async fn query_table_connection(
        &self,
        _table: &str,
        _where_clause: Option<WhereClause>,
        _order_by: Option<Vec<OrderBy>>,
        _first: Option<i32>,
        _after: Option<String>,
        _last: Option<i32>,
        _before: Option<String>,
    ) -> GqlResult<RowConnection> {
        Ok(RowConnection {
            edges: vec![],
            page_info: PageInfo {
                has_next_page: false,
                has_previous_page: false,
                start_cursor: None,
                end_cursor: None,
                total_count: BigInt(0),
            },
            total_count: BigInt(0),
        })
    }

    pub async fn get_row(&self, _table: &str, _id: &ID) -> GqlResult<Option<RowType>> {
        Ok(None)
    }

    pub async fn aggregate(
        &self,
        _table: &str,
        _aggregates: Vec<AggregateInput>,
        _where_clause: Option<WhereClause>,
        _group_by: Option<Vec<String>>,
    ) -> GqlResult<Vec<AggregateResult>> {
        Ok(vec![])
    }

    pub async fn count(&self, _table: &str, _where_clause: Option<WhereClause>) -> GqlResult<i64> {
        Ok(0)
    }

    pub async fn execute_sql(&self, _sql: &str, _params: Option<Vec<Json>>) -> Result<(Vec<RowType>, i64)> {
        Ok((vec![], 0))
    }

    pub async fn search(
        &self,
        _query: &str,
        _tables: Option<Vec<String>>,
        _fields: Option<Vec<String>>,
        _limit: Option<i32>,
    ) -> GqlResult<SearchResult> {
        Ok(SearchResult {
            results: vec![],
            total_count: BigInt(0),
            execution_time_ms: 0.0,
        })
    }

    pub async fn explain(
        &self,
        _table: &str,
        _where_clause: Option<WhereClause>,
        _order_by: Option<Vec<OrderBy>>,
    ) -> GqlResult<QueryPlan> {
        Ok(QueryPlan {
            plan_text: "Sequential Scan".to_string(),
            estimated_cost: 0.0,
            estimated_rows: BigInt(0),
            operations: vec![],
        })
    }

    // Mutation operations
    pub async fn insert_one(&self, _table: &str, _data: HashMap<String, Json>) -> Result<RowType> {
        Err(DbError::NotImplemented("insert_one".to_string()))
    }

    pub async fn insert_many(&self, _table: &str, _data: Vec<HashMap<String, Json>>) -> Result<Vec<RowType>> {
        Err(DbError::NotImplemented("insert_many".to_string()))
    }

    pub async fn update_one(&self, _table: &str, _id: &ID, _data: HashMap<String, Json>) -> Result<Option<RowType>> {
        Ok(None)
    }

    pub async fn update_many(
        &self,
        _table: &str,
        _where_clause: WhereClause,
        _data: HashMap<String, Json>,
    ) -> Result<Vec<RowType>> {
        Ok(vec![])
    }

    pub async fn delete_one(&self, _table: &str, _id: &ID) -> Result<bool> {
        Ok(false)
    }

    pub async fn delete_many(&self, _table: &str, _where_clause: WhereClause) -> Result<i32> {
        Ok(0)
    }

    pub async fn upsert(
        &self,
        _table: &str,
        _unique_fields: Vec<String>,
        _data: HashMap<String, Json>,
    ) -> Result<(RowType, bool)> {
        Err(DbError::NotImplemented("upsert".to_string()))
    }

    pub async fn bulk_insert(&self, _table: &str, _data: Vec<HashMap<String, Json>>, _batch_size: i32) -> Result<i32> {
        Ok(0)
    }

    // Transaction operations
    pub async fn begin_transaction(&self, _isolation_level: Option<IsolationLevel>) -> GqlResult<TransactionResult> {
        Ok(TransactionResult {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            status: "ACTIVE".to_string(),
            timestamp: DateTime::now(),
        })
    }

    pub async fn commit_transaction(&self, transaction_id: &str) -> GqlResult<TransactionResult> {
        Ok(TransactionResult {
            transaction_id: transaction_id.to_string(),
            status: "COMMITTED".to_string(),
            timestamp: DateTime::now(),
        })
    }

    pub async fn rollback_transaction(&self, transaction_id: &str) -> GqlResult<TransactionResult> {
        Ok(TransactionResult {
            transaction_id: transaction_id.to_string(),
            status: "ROLLED_BACK".to_string(),
            timestamp: DateTime::now(),
        })
    }

    pub async fn execute_transaction(
        &self,
        _operations: Vec<TransactionOperation>,
        _isolation_level: Option<IsolationLevel>,
    ) -> Result<Vec<String>> {
        Ok(vec![])
    }

    // Subscription operations
    pub async fn register_table_subscription(
        &self,
        table: &str,
        filter: Option<WhereClause>,
        _tx: broadcast::Sender<TableChange>,
    ) -> String {
        self.subscription_manager.register_subscription(table, filter).await
    }

    pub async fn register_insert_subscription(
        &self,
        table: &str,
        filter: Option<WhereClause>,
        _tx: broadcast::Sender<RowInserted>,
    ) -> String {
        self.subscription_manager.register_subscription(table, filter).await
    }

    pub async fn register_update_subscription(
        &self,
        table: &str,
        filter: Option<WhereClause>,
        _tx: broadcast::Sender<RowUpdated>,
    ) -> String {
        self.subscription_manager.register_subscription(table, filter).await
    }

    pub async fn register_delete_subscription(
        &self,
        table: &str,
        filter: Option<WhereClause>,
        _tx: broadcast::Sender<RowDeleted>,
    ) -> String {
        self.subscription_manager.register_subscription(table, filter).await
    }

    pub async fn register_row_subscription(
        &self,
        table: &str,
        _id: &ID,
        _tx: broadcast::Sender<RowChange>,
    ) -> String {
        self.subscription_manager.register_subscription(table, None).await
    }
}

