use crate::allocation::Allocation;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::store::AllocationStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An allocation annotated with its derived monetary cost. The canonical
/// allocation record is carried whole; cost and currency are output-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedAllocation {
    pub allocation: Allocation,
    pub calculated_cost: f64,
    /// Currency of the rate used, passed through unmodified.
    pub currency: String,
}

/// Per-task and per-resource cost totals. Totals sum raw amounts; no
/// cross-currency conversion happens anywhere in the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_cost: f64,
    pub by_task: BTreeMap<String, f64>,
    pub by_resource: BTreeMap<String, f64>,
}

/// Derives cost per allocation:
/// `duration_days * working_hours_per_day * (percent / 100) * hourly_rate`,
/// with the day count inclusive of both endpoints.
pub struct CostCalculator {
    working_hours_per_day: f64,
}

impl CostCalculator {
    pub fn new(working_hours_per_day: f64) -> Self {
        Self {
            working_hours_per_day,
        }
    }

    /// Enrich every allocation and aggregate the totals. The rate comes from
    /// the cost record covering the allocation start, falling back to the
    /// resource's inline hourly rate. A resource with neither yields zero
    /// cost and one `missing_cost_record` diagnostic.
    pub fn enrich(
        &self,
        store: &AllocationStore,
        diagnostics: &mut Diagnostics,
    ) -> (Vec<EnrichedAllocation>, CostSummary) {
        let mut enriched = Vec::with_capacity(store.allocation_count());
        let mut summary = CostSummary::default();
        let mut warned: BTreeSet<String> = BTreeSet::new();

        for allocation in store.allocations() {
            let (rate, currency) = self.rate_for(store, allocation, diagnostics, &mut warned);
            let cost = allocation.duration_days() as f64
                * self.working_hours_per_day
                * (allocation.allocation_percent / 100.0)
                * rate;

            summary.total_cost += cost;
            *summary.by_task.entry(allocation.task_id.clone()).or_insert(0.0) += cost;
            *summary
                .by_resource
                .entry(allocation.resource_id.clone())
                .or_insert(0.0) += cost;

            enriched.push(EnrichedAllocation {
                allocation: allocation.clone(),
                calculated_cost: cost,
                currency,
            });
        }

        (enriched, summary)
    }

    fn rate_for(
        &self,
        store: &AllocationStore,
        allocation: &Allocation,
        diagnostics: &mut Diagnostics,
        warned: &mut BTreeSet<String>,
    ) -> (f64, String) {
        if let Some(record) = store.cost_record_for(&allocation.resource_id, allocation.start_date)
        {
            return (record.hourly_cost, record.currency.clone());
        }
        if let Some(resource) = store.resource(&allocation.resource_id) {
            if let Some(rate) = resource.hourly_cost {
                return (rate, resource.currency.clone());
            }
            if warned.insert(resource.id.clone()) {
                diagnostics.push(
                    DiagnosticKind::MissingCostRecord,
                    resource.id.clone(),
                    format!("no cost record or hourly rate for resource {}", resource.id),
                );
            }
            return (0.0, resource.currency.clone());
        }
        (0.0, "USD".to_string())
    }
}
