use crate::allocation::Allocation;
use crate::store::AllocationStore;
use crate::task_tree::TaskIndex;
use crate::utilization::capacity_slices;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    TimeOverlap,
    Capacity,
    SkillMismatch,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::TimeOverlap => "time_overlap",
            ConflictType::Capacity => "capacity",
            ConflictType::SkillMismatch => "skill_mismatch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Info,
    Medium,
    High,
    Critical,
}

impl ConflictSeverity {
    /// Severity grows with the percent by which a slice exceeds capacity.
    pub fn from_excess(excess: f64) -> Self {
        if excess > 50.0 {
            ConflictSeverity::Critical
        } else if excess > 25.0 {
            ConflictSeverity::High
        } else {
            ConflictSeverity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Info => "info",
            ConflictSeverity::Medium => "medium",
            ConflictSeverity::High => "high",
            ConflictSeverity::Critical => "critical",
        }
    }
}

/// A detected violation among allocations sharing a resource. Derived per
/// run, never persisted as input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_type: ConflictType,
    pub resource_id: String,
    pub allocation_ids: Vec<String>,
    pub severity: ConflictSeverity,
    /// Peak percent above the limit for overlap/capacity conflicts;
    /// zero for skill mismatches.
    pub excess_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
    pub suggested_resolution: String,
}

/// Ordering used whenever contested allocations must be resolved in
/// sequence: higher task priority first, then earlier start date, then
/// lexicographic allocation id. The id tie-break is a stable-but-arbitrary
/// assumption; nothing stronger is implied.
pub fn resolution_order(a: &Allocation, b: &Allocation, tasks: &TaskIndex) -> Ordering {
    tasks
        .priority_of(&b.task_id)
        .cmp(&tasks.priority_of(&a.task_id))
        .then_with(|| a.start_date.cmp(&b.start_date))
        .then_with(|| a.id.cmp(&b.id))
}

pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Sweep every resource's allocations for overlap, capacity, and skill
    /// conflicts. Output order is deterministic: resources by id, overlap
    /// runs by period, then capacity and skill findings by allocation order.
    pub fn detect(&self, store: &AllocationStore) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        let tasks = store.tasks();

        for (resource_id, group) in store.allocations_by_resource() {
            let Some(resource) = store.resource(resource_id) else {
                continue;
            };
            let active: Vec<&Allocation> = group
                .iter()
                .copied()
                .filter(|a| a.counts_toward_load())
                .collect();

            conflicts.extend(Self::overlap_conflicts(resource_id, &active));

            for allocation in &active {
                if allocation.allocation_percent > resource.capacity + EPSILON {
                    conflicts.push(Conflict {
                        conflict_type: ConflictType::Capacity,
                        resource_id: resource_id.to_string(),
                        allocation_ids: vec![allocation.id.clone()],
                        severity: ConflictSeverity::from_excess(
                            allocation.allocation_percent - resource.capacity,
                        ),
                        excess_percent: allocation.allocation_percent - resource.capacity,
                        period_start: Some(allocation.start_date),
                        period_end: Some(allocation.end_date),
                        suggested_resolution: format!(
                            "reduce allocation {} below the {}% capacity of {} or split the assignment",
                            allocation.id, resource.capacity, resource_id
                        ),
                    });
                }
            }

            if !tasks.is_empty() {
                for allocation in &active {
                    let required = tasks.required_skills_of(&allocation.task_id);
                    if !required.is_empty() && !resource.has_any_skill(required) {
                        conflicts.push(Conflict {
                            conflict_type: ConflictType::SkillMismatch,
                            resource_id: resource_id.to_string(),
                            allocation_ids: vec![allocation.id.clone()],
                            severity: ConflictSeverity::Info,
                            excess_percent: 0.0,
                            period_start: Some(allocation.start_date),
                            period_end: Some(allocation.end_date),
                            suggested_resolution: format!(
                                "assign a resource with one of [{}] to task {} or plan training for {}",
                                required.join(", "),
                                allocation.task_id,
                                resource_id
                            ),
                        });
                    }
                }
            }
        }

        conflicts
    }

    /// Merge consecutive date-adjacent slices whose summed percent exceeds
    /// 100 into one conflict covering the whole overloaded period.
    fn overlap_conflicts(resource_id: &str, active: &[&Allocation]) -> Vec<Conflict> {
        let slices = capacity_slices(active);
        let mut conflicts = Vec::new();

        let mut run_start: Option<NaiveDate> = None;
        let mut run_end = None;
        let mut run_peak = 0.0_f64;
        let mut run_ids: Vec<String> = Vec::new();

        let mut flush = |start: &mut Option<NaiveDate>,
                         end: &mut Option<NaiveDate>,
                         peak: &mut f64,
                         ids: &mut Vec<String>| {
            if let (Some(s), Some(e)) = (start.take(), end.take()) {
                ids.sort();
                ids.dedup();
                let excess = *peak - 100.0;
                conflicts.push(Conflict {
                    conflict_type: ConflictType::TimeOverlap,
                    resource_id: resource_id.to_string(),
                    allocation_ids: std::mem::take(ids),
                    severity: ConflictSeverity::from_excess(excess),
                    excess_percent: excess,
                    period_start: Some(s),
                    period_end: Some(e),
                    suggested_resolution: format!(
                        "shift or reduce overlapping allocations on {} between {} and {}",
                        resource_id, s, e
                    ),
                });
                *peak = 0.0;
            }
        };

        for slice in &slices {
            if slice.total_percent > 100.0 + EPSILON {
                let adjacent = run_end
                    .map(|e: NaiveDate| e + Duration::days(1) == slice.start)
                    .unwrap_or(false);
                if run_start.is_some() && !adjacent {
                    flush(&mut run_start, &mut run_end, &mut run_peak, &mut run_ids);
                }
                if run_start.is_none() {
                    run_start = Some(slice.start);
                }
                run_end = Some(slice.end);
                run_peak = run_peak.max(slice.total_percent);
                run_ids.extend(slice.allocation_ids.iter().cloned());
            } else if run_start.is_some() {
                flush(&mut run_start, &mut run_end, &mut run_peak, &mut run_ids);
            }
        }
        flush(&mut run_start, &mut run_end, &mut run_peak, &mut run_ids);

        conflicts
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}
