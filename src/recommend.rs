use crate::conflict::{Conflict, ConflictType};
use crate::utilization::{UtilizationBand, UtilizationReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An actionable, per-resource suggestion derived from the utilization and
/// conflict findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub resource_id: String,
    pub band: UtilizationBand,
    pub efficiency_score: f64,
    pub message: String,
}

/// Rule table over (utilization band x conflict presence). Output is ranked
/// worst-first: efficiency score ascending, ties by resource id.
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn recommend(
        &self,
        report: &UtilizationReport,
        conflicts: &[Conflict],
    ) -> Vec<Recommendation> {
        let conflicted: BTreeSet<&str> = conflicts
            .iter()
            .map(|c| c.resource_id.as_str())
            .collect();
        let overlapped: BTreeSet<&str> = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::TimeOverlap)
            .map(|c| c.resource_id.as_str())
            .collect();

        let mut recommendations: Vec<Recommendation> = report
            .entries
            .iter()
            .filter_map(|entry| {
                let id = entry.resource_id.as_str();
                let message = Self::rule(entry.band, conflicted.contains(id), overlapped.contains(id))?;
                Some(Recommendation {
                    resource_id: entry.resource_id.clone(),
                    band: entry.band,
                    efficiency_score: entry.efficiency_score,
                    message: message.to_string(),
                })
            })
            .collect();

        recommendations.sort_by(|a, b| {
            a.efficiency_score
                .partial_cmp(&b.efficiency_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.resource_id.cmp(&b.resource_id))
        });
        recommendations
    }

    fn rule(band: UtilizationBand, has_conflict: bool, has_overlap: bool) -> Option<&'static str> {
        match (band, has_conflict) {
            (UtilizationBand::Overallocated, _) if has_overlap => {
                Some("redistribute load across the overlap window or add a resource")
            }
            (UtilizationBand::Overallocated, _) => {
                Some("reduce allocation percentages to bring load back under capacity")
            }
            (UtilizationBand::SignificantlyUnderutilized, false) => {
                Some("consider assigning additional tasks")
            }
            (UtilizationBand::SignificantlyUnderutilized, true) => {
                Some("resolve skill or capacity mismatches before assigning more work")
            }
            (UtilizationBand::Underutilized, false) => {
                Some("capacity available for additional work")
            }
            (UtilizationBand::Underutilized, true) => {
                Some("clear outstanding conflicts, then take on additional work")
            }
            (UtilizationBand::OptimalHigh, true) | (UtilizationBand::Optimal, true) => {
                Some("resolve conflicts without raising the overall load")
            }
            // Healthy load, no findings: nothing to say.
            (UtilizationBand::OptimalHigh, false) | (UtilizationBand::Optimal, false) => None,
        }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}
