use crate::allocation::Allocation;
use crate::store::AllocationStore;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One homogeneous period of demand on a resource: no allocation starts or
/// ends strictly inside it, so the summed percent is constant across it.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacitySlice {
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    pub total_percent: f64,
    /// Ids of the allocations active in the slice, in input order.
    pub allocation_ids: Vec<String>,
}

/// Cut the given allocations into capacity slices along their date
/// boundaries. Overlapping allocations add within a slice. Gaps between
/// allocations produce no slice.
pub fn capacity_slices(allocations: &[&Allocation]) -> Vec<CapacitySlice> {
    let mut boundaries: BTreeSet<NaiveDate> = BTreeSet::new();
    for allocation in allocations {
        boundaries.insert(allocation.start_date);
        boundaries.insert(allocation.end_date + Duration::days(1));
    }

    let points: Vec<NaiveDate> = boundaries.into_iter().collect();
    let mut slices = Vec::new();
    for window in points.windows(2) {
        let start = window[0];
        let end = window[1] - Duration::days(1);
        let mut total = 0.0;
        let mut ids = Vec::new();
        for allocation in allocations {
            if allocation.start_date <= start && allocation.end_date >= end {
                total += allocation.allocation_percent;
                ids.push(allocation.id.clone());
            }
        }
        if !ids.is_empty() {
            slices.push(CapacitySlice {
                start,
                end,
                total_percent: total,
                allocation_ids: ids,
            });
        }
    }
    slices
}

/// Utilization classification bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationBand {
    Overallocated,
    OptimalHigh,
    Optimal,
    Underutilized,
    SignificantlyUnderutilized,
}

impl UtilizationBand {
    pub fn classify(rate: f64) -> Self {
        if rate > 100.0 {
            UtilizationBand::Overallocated
        } else if rate >= 90.0 {
            UtilizationBand::OptimalHigh
        } else if rate >= 80.0 {
            UtilizationBand::Optimal
        } else if rate >= 60.0 {
            UtilizationBand::Underutilized
        } else {
            UtilizationBand::SignificantlyUnderutilized
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UtilizationBand::Overallocated => "overallocated",
            UtilizationBand::OptimalHigh => "optimal_high",
            UtilizationBand::Optimal => "optimal",
            UtilizationBand::Underutilized => "underutilized",
            UtilizationBand::SignificantlyUnderutilized => "significantly_underutilized",
        }
    }
}

/// Score how close a utilization rate sits to the optimal band.
/// 100 inside [80, 100], steep penalty above, the rate itself below.
pub fn efficiency_score(rate: f64) -> f64 {
    if rate > 100.0 {
        (100.0 - (rate - 100.0) * 2.0).max(0.0)
    } else if rate >= 80.0 {
        100.0
    } else {
        rate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUtilization {
    pub resource_id: String,
    pub resource_name: String,
    /// Peak slice load over the resource's allocation window, as a percent
    /// of its capacity. Overlapping allocations add, never average.
    pub utilization_rate: f64,
    pub band: UtilizationBand,
    pub efficiency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationReport {
    /// One entry per known resource, sorted by resource id.
    pub entries: Vec<ResourceUtilization>,
    /// Arithmetic mean of the per-resource efficiency scores.
    pub overall_efficiency: f64,
}

impl UtilizationReport {
    pub fn entry(&self, resource_id: &str) -> Option<&ResourceUtilization> {
        self.entries.iter().find(|e| e.resource_id == resource_id)
    }
}

/// Pure, stateless utilization computation. Re-running on unchanged input
/// yields an identical report.
pub struct UtilizationAnalyzer;

impl UtilizationAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, store: &AllocationStore) -> UtilizationReport {
        let groups = store.allocations_by_resource();
        let mut entries = Vec::with_capacity(store.resource_count());

        for resource in store.resources() {
            let active: Vec<&Allocation> = groups
                .get(resource.id.as_str())
                .map(|allocations| {
                    allocations
                        .iter()
                        .copied()
                        .filter(|a| a.counts_toward_load())
                        .collect()
                })
                .unwrap_or_default();

            let peak = capacity_slices(&active)
                .iter()
                .map(|slice| slice.total_percent)
                .fold(0.0_f64, f64::max);
            let rate = peak / resource.capacity * 100.0;

            entries.push(ResourceUtilization {
                resource_id: resource.id.clone(),
                resource_name: resource.name.clone(),
                utilization_rate: rate,
                band: UtilizationBand::classify(rate),
                efficiency_score: efficiency_score(rate),
            });
        }

        let overall_efficiency = if entries.is_empty() {
            0.0
        } else {
            entries.iter().map(|e| e.efficiency_score).sum::<f64>() / entries.len() as f64
        };

        UtilizationReport {
            entries,
            overall_efficiency,
        }
    }
}

impl Default for UtilizationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn alloc(id: &str, pct: f64, start: NaiveDate, end: NaiveDate) -> Allocation {
        Allocation::new(id, "t1", "r1", pct, start, end)
    }

    #[test]
    fn overlapping_allocations_add_within_slice() {
        let a1 = alloc("a1", 60.0, d(2025, 1, 1), d(2025, 1, 10));
        let a2 = alloc("a2", 60.0, d(2025, 1, 5), d(2025, 1, 15));
        let slices = capacity_slices(&[&a1, &a2]);

        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].start, d(2025, 1, 1));
        assert_eq!(slices[0].end, d(2025, 1, 4));
        assert_eq!(slices[0].total_percent, 60.0);
        assert_eq!(slices[1].start, d(2025, 1, 5));
        assert_eq!(slices[1].end, d(2025, 1, 10));
        assert_eq!(slices[1].total_percent, 120.0);
        assert_eq!(slices[1].allocation_ids, vec!["a1", "a2"]);
        assert_eq!(slices[2].start, d(2025, 1, 11));
        assert_eq!(slices[2].end, d(2025, 1, 15));
        assert_eq!(slices[2].total_percent, 60.0);
    }

    #[test]
    fn gap_between_allocations_produces_no_slice() {
        let a1 = alloc("a1", 50.0, d(2025, 1, 1), d(2025, 1, 5));
        let a2 = alloc("a2", 50.0, d(2025, 1, 10), d(2025, 1, 12));
        let slices = capacity_slices(&[&a1, &a2]);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].end, d(2025, 1, 5));
        assert_eq!(slices[1].start, d(2025, 1, 10));
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(UtilizationBand::classify(120.0), UtilizationBand::Overallocated);
        assert_eq!(UtilizationBand::classify(100.0), UtilizationBand::OptimalHigh);
        assert_eq!(UtilizationBand::classify(90.0), UtilizationBand::OptimalHigh);
        assert_eq!(UtilizationBand::classify(85.0), UtilizationBand::Optimal);
        assert_eq!(UtilizationBand::classify(80.0), UtilizationBand::Optimal);
        assert_eq!(UtilizationBand::classify(70.0), UtilizationBand::Underutilized);
        assert_eq!(
            UtilizationBand::classify(59.9),
            UtilizationBand::SignificantlyUnderutilized
        );
    }

    #[test]
    fn efficiency_score_examples() {
        assert_eq!(efficiency_score(95.0), 100.0);
        assert_eq!(efficiency_score(120.0), 60.0);
        assert_eq!(efficiency_score(50.0), 50.0);
        assert_eq!(efficiency_score(200.0), 0.0);
    }
}
