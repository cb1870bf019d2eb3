use crate::execution::planner::PlanNode;
use crate::Result;

/// Cost-based query optimizer
pub struct Optimizer;

impl Optimizer {
    pub fn new() -> Self {
        Self
    }
    
    pub fn optimize(&self, plan: PlanNode) -> Result<PlanNode> {
        // TODO: Implement advanced optimizations:
        // - Predicate pushdown
        // - Join reordering
        // - Index selection
        // - Partition pruning
        // - Constant folding
        
        // For now, perform simple pass-through
        // Future: Apply cost-based transformations
        Ok(plan)
    }
    
    fn estimate_cost(&self, _plan: &PlanNode) -> f64 {
        // Placeholder cost estimation
        1.0
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_optimizer() {
        let optimizer = Optimizer::new();
        let plan = PlanNode::TableScan {
            table: "users".to_string(),
            columns: vec!["id".to_string()],
        };
        
        let optimized = optimizer.optimize(plan).unwrap();
        matches!(optimized, PlanNode::TableScan { .. });
    }
}
