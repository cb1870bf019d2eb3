// Enterprise Integration Module
//
// Part of the Enterprise Integration Layer for RustyDB

use std::collections::{HashMap, BTreeMap, VecDeque};
use std::sync::{Arc, RwLock, Mutex};
use std::time::{Duration, Instant, SystemTime};
use std::fmt;
use tokio::time::sleep;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::error::DbError;
use super::registry::*;

// ============================================================================
// SECTION 3: RESOURCE ORCHESTRATION (500+ lines)
// ============================================================================

/// Resource budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceBudget {
    pub memory_limit: usize,
    pub connection_limit: usize,
    pub thread_limit: usize,
    pub io_quota: usize,
    pub cpu_quota: f32,
}

/// Memory budget allocator
pub struct MemoryBudgetAllocator {
    total_budget: usize,
    allocations: Arc<RwLock<HashMap<String, usize>>>,
    reserved: Arc<RwLock<usize>>,
}

impl MemoryBudgetAllocator {
    pub fn new(total_budget: usize) -> Self {
        Self {
            total_budget,
            allocations: Arc::new(RwLock::new(HashMap::new())),
            reserved: Arc::new(RwLock::new(0)),
        }
    }

    pub fn allocate(&self, service: &str, amount: usize) -> Result<(), DbError> {
        let mut allocations = self.allocations.write().unwrap();
        let mut reserved = self.reserved.write().unwrap();

        if *reserved + amount > self.total_budget {
            return Err(DbError::ResourceExhausted(
                "Memory budget exceeded".to_string()
            ));
        }

        allocations.insert(service.to_string(), amount);
        *reserved += amount;
        Ok(())
    }

    pub fn deallocate(&self, service: &str) -> Result<(), DbError> {
        let mut allocations = self.allocations.write().unwrap();
        let mut reserved = self.reserved.write().unwrap();

        if let Some(amount) = allocations.remove(service) {
            *reserved -= amount;
        }
        Ok(())
    }

    pub fn get_allocation(&self, service: &str) -> Option<usize> {
        let allocations = self.allocations.read().unwrap();
        allocations.get(service).copied()
    }

    pub fn available_budget(&self) -> usize {
        let reserved = self.reserved.read().unwrap();
        self.total_budget - *reserved
    }
}

/// Connection quota manager
pub struct ConnectionQuotaManager {
    total_quota: usize,
    quotas: Arc<RwLock<HashMap<String, usize>>>,
    active_connections: Arc<RwLock<HashMap<String, usize>>>,
}

impl ConnectionQuotaManager {
    pub fn new(total_quota: usize) -> Self {
        Self {
            total_quota,
            quotas: Arc::new(RwLock::new(HashMap::new())),
            active_connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn set_quota(&self, service: &str, quota: usize) -> Result<(), DbError> {
        let mut quotas = self.quotas.write().unwrap();
        let total_allocated: usize = quotas.values().sum();

        if total_allocated + quota > self.total_quota {
            return Err(DbError::ResourceExhausted(
                "Connection quota exceeded".to_string()
            ));
        }

        quotas.insert(service.to_string(), quota);
        Ok(())
    }

    pub fn acquire_connection(&self, service: &str) -> Result<(), DbError> {
        let quotas = self.quotas.read().unwrap();
        let mut active = self.active_connections.write().unwrap();

        let quota = quotas.get(service)
            .ok_or_else(|| DbError::NotFound(format!("No quota for service: {}", service)))?;

        let current = active.entry(service.to_string()).or_insert(0);
        if *current >= *quota {
            return Err(DbError::ResourceExhausted(
                format!("Connection quota exceeded for service: {}", service)
            ));
        }

        *current += 1;
        Ok(())
    }

    pub fn release_connection(&self, service: &str) {
        let mut active = self.active_connections.write().unwrap();
        if let Some(count) = active.get_mut(service) {
            if *count > 0 {
                *count -= 1;
            }
        }
    }

    pub fn get_active_connections(&self, service: &str) -> usize {
        let active = self.active_connections.read().unwrap();
        active.get(service).copied().unwrap_or(0)
    }
}

/// Thread pool coordinator
pub struct ThreadPoolCoordinator {
    pools: Arc<RwLock<HashMap<String, tokio::runtime::Handle>>>,
    thread_budgets: Arc<RwLock<HashMap<String, usize>>>,
}

impl ThreadPoolCoordinator {
    pub fn new() -> Self {
        Self {
            pools: Arc::new(RwLock::new(HashMap::new())),
            thread_budgets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_pool(&self, name: &str, handle: tokio::runtime::Handle, thread_count: usize) {
        let mut pools = self.pools.write().unwrap();
        pools.insert(name.to_string(), handle);

        let mut budgets = self.thread_budgets.write().unwrap();
        budgets.insert(name.to_string(), thread_count);
    }

    pub fn get_pool(&self, name: &str) -> Option<tokio::runtime::Handle> {
        let pools = self.pools.read().unwrap();
        pools.get(name).cloned()
    }

    pub fn get_thread_budget(&self, name: &str) -> Option<usize> {
        let budgets = self.thread_budgets.read().unwrap();
        budgets.get(name).copied()
    }
}

/// I/O scheduler
pub struct IoScheduler {
    pending_operations: Arc<Mutex<VecDeque<IoOperation>>>,
    active_operations: Arc<RwLock<HashMap<String, IoOperation>>>,
    bandwidth_limit: Arc<RwLock<usize>>,
    current_bandwidth: Arc<RwLock<usize>>,
}

impl IoScheduler {
        pub(crate) fn next_operation(&self) -> Option<&IoOperation> {
            todo!()
        }
    }

impl IoScheduler {
    pub(crate) fn pending_count(&self) -> &usize {
        todo!()
    }
}

#[derive(Debug, Clone)]
pub struct IoOperation {
    pub id: String,
    pub operation_type: IoOperationType,
    pub priority: usize,
    pub size: usize,
    pub submitted_at: Instant,
    pub op_type: ()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoOperationType {
    Read,
    Write,
    Sync,
}

impl IoScheduler {
    pub fn new(bandwidth_limit: usize) -> Self {
        Self {
            pending_operations: Arc::new(Mutex::new(VecDeque::new())),
            active_operations: Arc::new(RwLock::new(HashMap::new())),
            bandwidth_limit: Arc::new(RwLock::new(bandwidth_limit)),
            current_bandwidth: Arc::new(RwLock::new(0)),
        }
    }

    pub fn submit_operation(&self, operation: IoOperation) {
        let mut pending = self.pending_operations.lock().unwrap();
        pending.push_back(operation);
    }

    pub fn schedule_next(&self) -> Option<IoOperation> {
        let mut pending = self.pending_operations.lock().unwrap();
        let bandwidth_limit = *self.bandwidth_limit.read().unwrap();
        let current = *self.current_bandwidth.read().unwrap();

        // Find highest priority operation that fits in bandwidth
        let mut best_idx = None;
        let mut best_priority = 0;

        for (idx, op) in pending.iter().enumerate() {
            if current + op.size <= bandwidth_limit && op.priority > best_priority {
                best_idx = Some(idx);
                best_priority = op.priority;
            }
        }

        if let Some(idx) = best_idx {
            let operation = pending.remove(idx).unwrap();

            // Update bandwidth usage
            let mut current_bw = self.current_bandwidth.write().unwrap();
            *current_bw += operation.size;

            // Track active operation
            let mut active = self.active_operations.write().unwrap();
            active.insert(operation.id.clone(), operation.clone());

            Some(operation)
        } else {
            None
        }
    }

    pub fn complete_operation(&self, operation_id: &str) {
        let mut active = self.active_operations.write().unwrap();
        if let Some(operation) = active.remove(operation_id) {
            let mut current = self.current_bandwidth.write().unwrap();
            *current = current.saturating_sub(operation.size);
        }
    }

    pub fn reset_bandwidth(&self) {
        let mut current = self.current_bandwidth.write().unwrap();
        *current = 0;
    }
}

/// Priority manager
pub struct PriorityManager {
    priorities: Arc<RwLock<HashMap<String, usize>>>,
    priority_queues: Arc<RwLock<BTreeMap<usize, Vec<String>>>>,
}

impl PriorityManager {
    pub fn new() -> Self {
        Self {
            priorities: Arc::new(RwLock::new(HashMap::new())),
            priority_queues: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn set_priority(&self, task_id: &str, priority: usize) {
        let mut priorities = self.priorities.write().unwrap();
        priorities.insert(task_id.to_string(), priority);

        let mut queues = self.priority_queues.write().unwrap();
        queues.entry(priority)
            .or_insert_with(VecDeque::new)
            .push_back(task_id.to_string());
    }

    pub fn get_next_task(&self) -> Option<String> {
        let mut queues = self.priority_queues.write().unwrap();

        // Get highest priority queue
        if let Some((&_priority, queue)) = queues.iter_mut().next_back() {
            queue.pop_front()
        } else {
            None
        }
    }

    pub fn get_priority(&self, task_id: &str) -> Option<usize> {
        let priorities = self.priorities.read().unwrap();
        priorities.get(task_id).copied()
    }
}

/// Resource contention handler
pub struct ResourceContentionHandler {
    contentions: Arc<RwLock<Vec<ResourceContention>>>,
    resolution_strategies: Arc<RwLock<HashMap<String, Box<dyn ContentionResolver>>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContention {
    pub id: String,
    pub resource_type: String,
    pub contenders: Vec<String>,
    pub detected_at: SystemTime,
    pub severity: ContentionSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentionSeverity {
    Low,
    Medium,
    High,
    Critical,
}

pub trait ContentionResolver: Send + Sync {
    fn resolve(&self, contention: &ResourceContention) -> Result<String, DbError>;
}

impl ResourceContentionHandler {
    pub fn new() -> Self {
        Self {
            contentions: Arc::new(RwLock::new(Vec::new())),
            resolution_strategies: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_contention(&self, contention: ResourceContention) {
        let mut contentions = self.contentions.write().unwrap();
        contentions.push(contention);
    }

    pub fn register_resolver(&self, resource_type: &str, resolver: Box<dyn ContentionResolver>) {
        let mut strategies = self.resolution_strategies.write().unwrap();
        strategies.insert(resource_type.to_string(), resolver);
    }

    pub fn resolve_contentions(&self) -> Result<Vec<String>, DbError> {
        let mut contentions = self.contentions.write().unwrap();
        let strategies = self.resolution_strategies.read().unwrap();
        let mut resolutions = Vec::new();

        contentions.retain(|contention| {
            if let Some(resolver) = strategies.get(&contention.resource_type) {
                match resolver.resolve(contention) {
                    Ok(resolution) => {
                        resolutions.push(resolution);
                        false // Remove resolved contention
                    }
                    Err(_) => true // Keep unresolved contention
                }
            } else {
                true // Keep if no resolver
            }
        });

        Ok(resolutions)
    }

    pub fn get_contentions(&self) -> Vec<ResourceContention> {
        let contentions = self.contentions.read().unwrap();
        contentions.clone()
    }
}

/// Resource orchestrator
pub struct ResourceOrchestrator {
    memory_allocator: Arc<MemoryBudgetAllocator>,
    connection_manager: Arc<ConnectionQuotaManager>,
    thread_coordinator: Arc<ThreadPoolCoordinator>,
    io_scheduler: Arc<IoScheduler>,
    priority_manager: Arc<PriorityManager>,
    contention_handler: Arc<ResourceContentionHandler>,
}

impl ResourceOrchestrator {
    pub fn new(budget: ResourceBudget) -> Self {
        Self {
            memory_allocator: Arc::new(MemoryBudgetAllocator::new(budget.memory_limit)),
            connection_manager: Arc::new(ConnectionQuotaManager::new(budget.connection_limit)),
            thread_coordinator: Arc::new(ThreadPoolCoordinator::new()),
            io_scheduler: Arc::new(IoScheduler::new(budget.io_quota)),
            priority_manager: Arc::new(PriorityManager::new()),
            contention_handler: Arc::new(ResourceContentionHandler::new()),
        }
    }

    pub fn memory_allocator(&self) -> &Arc<MemoryBudgetAllocator> {
        &self.memory_allocator
    }

    pub fn connection_manager(&self) -> &Arc<ConnectionQuotaManager> {
        &self.connection_manager
    }

    pub fn thread_coordinator(&self) -> &Arc<ThreadPoolCoordinator> {
        &self.thread_coordinator
    }

    pub fn io_scheduler(&self) -> &Arc<IoScheduler> {
        &self.io_scheduler
    }

    pub fn priority_manager(&self) -> &Arc<PriorityManager> {
        &self.priority_manager
    }

    pub fn contention_handler(&self) -> &Arc<ResourceContentionHandler> {
        &self.contention_handler
    }

    pub async fn orchestrate_resources(&self) -> Result<(), DbError> {
        // Resolve any resource contentions
        self.contention_handler.resolve_contentions()?;

        // Schedule I/O operations
        while let Some(_operation) = self.io_scheduler.schedule_next() {
            // Operations are handled by the scheduler
        }

        Ok(())
    }
}
