//! Política de poda: acota un grafo a poco trabajo para feedback rápido.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PRUNE_BOUND;
use crate::errors::RunnerError;
use crate::graph::GraphRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrunePolicy {
    pub enabled: bool,
    pub bound: usize,
}

impl Default for PrunePolicy {
    fn default() -> Self {
        Self { enabled: false,
               bound: DEFAULT_PRUNE_BOUND }
    }
}

impl PrunePolicy {
    pub fn new(enabled: bool, bound: usize) -> Result<Self, RunnerError> {
        if bound == 0 {
            return Err(RunnerError::Config("prune bound must be at least 1".into()));
        }
        Ok(Self { enabled, bound })
    }

    pub fn enabled() -> Self {
        Self { enabled: true,
               ..Self::default() }
    }

    /// Deshabilitada devuelve el mismo `Arc`. Habilitada devuelve un grafo
    /// nuevo con las primeras `bound` unidades.
    pub fn apply(&self, graph: &GraphRef) -> Result<GraphRef, RunnerError> {
        if !self.enabled {
            return Ok(Arc::clone(graph));
        }
        if self.bound == 0 {
            return Err(RunnerError::Config("prune bound must be at least 1".into()));
        }
        let pruned = graph.bounded(self.bound);
        log::info!("pruned recipe {} from {} to {} units", graph.id(), graph.unit_count(), pruned.unit_count());
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{PipelineGraph, WorkPlan};
    use crate::storage::StorageConfig;
    use serde_json::{json, Value};

    #[derive(Debug)]
    struct Units(usize);

    impl PipelineGraph for Units {
        fn id(&self) -> &str {
            "units"
        }
        fn unit_count(&self) -> usize {
            self.0
        }
        fn bounded(&self, bound: usize) -> GraphRef {
            Arc::new(Units(self.0.min(bound)))
        }
        fn plan(&self) -> WorkPlan {
            WorkPlan::new()
        }
        fn describe(&self) -> Value {
            json!({ "units": self.0 })
        }
        fn output_locations(&self, _storage: &StorageConfig) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn disabled_returns_same_graph() {
        let g: GraphRef = Arc::new(Units(10));
        let out = PrunePolicy::default().apply(&g).unwrap();
        assert!(Arc::ptr_eq(&g, &out));
    }

    #[test]
    fn enabled_bounds_without_mutating() {
        let g: GraphRef = Arc::new(Units(10));
        let out = PrunePolicy::enabled().apply(&g).unwrap();
        assert_eq!(out.unit_count(), 2);
        assert_eq!(g.unit_count(), 10);

        let small: GraphRef = Arc::new(Units(1));
        assert_eq!(PrunePolicy::enabled().apply(&small).unwrap().unit_count(), 1);
    }

    #[test]
    fn zero_bound_is_rejected() {
        assert!(matches!(PrunePolicy::new(true, 0), Err(RunnerError::Config(_))));
        let sneaky = PrunePolicy { enabled: true, bound: 0 };
        assert!(sneaky.apply(&(Arc::new(Units(3)) as GraphRef)).is_err());
    }
}
