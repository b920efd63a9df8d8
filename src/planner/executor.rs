//! Plan execution against a storage gateway
//!
//! Each lookup step yields a sorted id list; lists are intersected in step
//! order. An empty intermediate result stops execution early.

use std::collections::BTreeSet;

use tracing::debug;

use crate::storage::{StorageGateway, StorageResult};

use super::planner::{LookupStep, QueryPlan};

/// Runs query plans and returns matching ids in ascending order
pub struct PlanExecutor<'a> {
    store: &'a dyn StorageGateway,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(store: &'a dyn StorageGateway) -> Self {
        Self { store }
    }

    /// Executes the plan, returning candidate ids.
    ///
    /// Candidates come from the index only. Callers re-check the loaded
    /// records since an index entry may outlive the value it points to.
    pub async fn execute(&self, plan: &QueryPlan) -> StorageResult<Vec<String>> {
        if plan.is_full_scan() {
            let keys = self.store.scan_keys(&plan.record_prefix).await?;
            let mut ids: Vec<String> = keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&plan.record_prefix).map(str::to_string))
                .collect();
            ids.sort();
            return Ok(ids);
        }

        let mut result: Option<BTreeSet<String>> = None;
        for step in &plan.steps {
            let ids = self.run_step(step).await?;
            let next: BTreeSet<String> = match result {
                None => ids.into_iter().collect(),
                Some(current) => ids.into_iter().filter(|id| current.contains(id)).collect(),
            };
            debug!(step = %step, candidates = next.len(), "lookup step done");

            if next.is_empty() {
                return Ok(Vec::new());
            }
            result = Some(next);
        }

        Ok(result.map(|ids| ids.into_iter().collect()).unwrap_or_default())
    }

    async fn run_step(&self, step: &LookupStep) -> StorageResult<Vec<String>> {
        match step {
            LookupStep::Bucket { entry } => self.store.index_members(entry).await,
            LookupStep::Scan { prefix, bounds, .. } => {
                if bounds.is_inverted() {
                    return Ok(Vec::new());
                }
                self.store.index_scan(prefix, bounds).await
            }
        }
    }
}
