use crate::allocation::{Allocation, AllocationStatus};
use crate::conflict::resolution_order;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::store::AllocationStore;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
struct CommittedInterval {
    start: NaiveDate,
    end: NaiveDate,
    percent: f64,
}

/// Committed percent-load timeline for one resource during a leveling pass.
///
/// Intervals are kept sorted by start date. Unlike a busy/free calendar,
/// intervals may overlap; the load on a day is the sum of every interval
/// covering it.
#[derive(Debug, Clone, Default)]
pub struct CapacityTimeline {
    committed: Vec<CommittedInterval>,
}

impl CapacityTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(&mut self, start: NaiveDate, end: NaiveDate, percent: f64) {
        let idx = self.committed.partition_point(|iv| iv.start < start);
        self.committed.insert(idx, CommittedInterval { start, end, percent });
    }

    /// Summed committed percent on a single day.
    pub fn load_on(&self, day: NaiveDate) -> f64 {
        self.committed
            .iter()
            .take_while(|iv| iv.start <= day)
            .filter(|iv| iv.end >= day)
            .map(|iv| iv.percent)
            .sum()
    }

    /// First day in `[start, end]` where committed load plus `percent` would
    /// exceed 100. Load only rises where an interval begins, so checking the
    /// window start and each interval start inside the window is exhaustive.
    fn first_violation(&self, start: NaiveDate, end: NaiveDate, percent: f64) -> Option<NaiveDate> {
        let mut candidates: Vec<NaiveDate> = vec![start];
        for iv in &self.committed {
            if iv.start > start && iv.start <= end {
                candidates.push(iv.start);
            }
        }
        candidates.sort();
        candidates
            .into_iter()
            .find(|&day| self.load_on(day) + percent > 100.0 + EPSILON)
    }

    /// Earliest start on or after `from` such that the whole window of
    /// `duration_days` stays within 100% load. `None` when nothing fits with
    /// a start up to `horizon_end`.
    pub fn earliest_fit(
        &self,
        from: NaiveDate,
        duration_days: i64,
        percent: f64,
        horizon_end: NaiveDate,
    ) -> Option<NaiveDate> {
        let mut candidate = from;
        while candidate <= horizon_end {
            let end = candidate + Duration::days(duration_days - 1);
            let Some(violation) = self.first_violation(candidate, end, percent) else {
                return Some(candidate);
            };
            // Jump past the earliest release among the intervals loading the
            // violating day; re-check from there.
            let release = self
                .committed
                .iter()
                .filter(|iv| iv.start <= violation && iv.end >= violation)
                .map(|iv| iv.end)
                .min();
            let next = match release {
                Some(end) => end + Duration::days(1),
                None => candidate + Duration::days(1),
            };
            candidate = next.max(candidate + Duration::days(1));
        }
        None
    }
}

/// An allocation with its post-leveling dates. Duration always matches the
/// source allocation; only the placement moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeveledAllocation {
    pub allocation_id: String,
    pub task_id: String,
    pub resource_id: String,
    pub allocation_percent: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Days the allocation moved forward; zero when it kept its dates.
    pub shifted_days: i64,
    /// Set when no placement existed within the configured horizon. Dates
    /// then echo the original request and nothing was committed.
    pub unresolvable: bool,
}

/// Resource id to ordered allocation list, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeveledSchedule {
    pub resources: BTreeMap<String, Vec<LeveledAllocation>>,
}

impl LeveledSchedule {
    pub fn get(&self, resource_id: &str) -> Option<&[LeveledAllocation]> {
        self.resources.get(resource_id).map(Vec::as_slice)
    }

    pub fn all(&self) -> impl Iterator<Item = &LeveledAllocation> {
        self.resources.values().flatten()
    }

    pub fn find(&self, allocation_id: &str) -> Option<&LeveledAllocation> {
        self.all().find(|l| l.allocation_id == allocation_id)
    }
}

/// Greedy deterministic forward-scheduler. Re-runs from scratch on every
/// invocation; no state survives between runs.
pub struct ResourceLeveler {
    horizon_days: i64,
}

impl ResourceLeveler {
    pub fn new(horizon_days: i64) -> Self {
        Self { horizon_days }
    }

    /// Level every resource independently. Cancelled allocations are
    /// ignored; completed ones keep their recorded dates and are committed
    /// up front so live work must schedule around them.
    pub fn level(&self, store: &AllocationStore, diagnostics: &mut Diagnostics) -> LeveledSchedule {
        let tasks = store.tasks();
        let mut schedule = LeveledSchedule::default();

        for (resource_id, group) in store.allocations_by_resource() {
            let mut active: Vec<&Allocation> = group
                .iter()
                .copied()
                .filter(|a| a.counts_toward_load())
                .collect();
            active.sort_by(|a, b| resolution_order(a, b, tasks));

            let mut timeline = CapacityTimeline::new();
            for allocation in &active {
                if allocation.status == AllocationStatus::Completed {
                    timeline.commit(
                        allocation.start_date,
                        allocation.end_date,
                        allocation.allocation_percent,
                    );
                }
            }

            let mut leveled = Vec::with_capacity(active.len());
            for allocation in active {
                if allocation.status == AllocationStatus::Completed {
                    leveled.push(Self::unshifted(allocation));
                    continue;
                }

                let duration = allocation.duration_days();
                let horizon_end = allocation.start_date + Duration::days(self.horizon_days);
                match timeline.earliest_fit(
                    allocation.start_date,
                    duration,
                    allocation.allocation_percent,
                    horizon_end,
                ) {
                    Some(start) => {
                        let end = start + Duration::days(duration - 1);
                        timeline.commit(start, end, allocation.allocation_percent);
                        leveled.push(LeveledAllocation {
                            allocation_id: allocation.id.clone(),
                            task_id: allocation.task_id.clone(),
                            resource_id: allocation.resource_id.clone(),
                            allocation_percent: allocation.allocation_percent,
                            start_date: start,
                            end_date: end,
                            shifted_days: (start - allocation.start_date).num_days(),
                            unresolvable: false,
                        });
                    }
                    None => {
                        diagnostics.push(
                            DiagnosticKind::UnresolvableAllocation,
                            allocation.id.clone(),
                            format!(
                                "allocation {} found no placement on {} within {} days of {}",
                                allocation.id, resource_id, self.horizon_days, allocation.start_date
                            ),
                        );
                        let mut entry = Self::unshifted(allocation);
                        entry.unresolvable = true;
                        leveled.push(entry);
                    }
                }
            }

            if !leveled.is_empty() {
                schedule.resources.insert(resource_id.to_string(), leveled);
            }
        }

        schedule
    }

    fn unshifted(allocation: &Allocation) -> LeveledAllocation {
        LeveledAllocation {
            allocation_id: allocation.id.clone(),
            task_id: allocation.task_id.clone(),
            resource_id: allocation.resource_id.clone(),
            allocation_percent: allocation.allocation_percent,
            start_date: allocation.start_date,
            end_date: allocation.end_date,
            shifted_days: 0,
            unresolvable: false,
        }
    }
}
