use crate::config::AnalysisConfig;
use crate::conflict::{Conflict, ConflictDetector};
use crate::cost::{CostCalculator, CostSummary, EnrichedAllocation};
use crate::diagnostics::Diagnostics;
use crate::leveling::{LeveledSchedule, ResourceLeveler};
use crate::recommend::{Recommendation, RecommendationEngine};
use crate::snapshot::{self, InputBundle, SnapshotResult};
use crate::store::AllocationStore;
use crate::utilization::{UtilizationAnalyzer, UtilizationReport};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything one analysis run produces. The subsystem owns these derived
/// collections outright; the canonical resource/allocation records stay with
/// the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub enriched_allocations: Vec<EnrichedAllocation>,
    pub utilization_report: UtilizationReport,
    pub conflicts: Vec<Conflict>,
    pub leveled_schedule: LeveledSchedule,
    pub cost_summary: CostSummary,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: Diagnostics,
}

impl AnalysisBundle {
    /// Compact single-line digest for CLI display.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("allocations={}", self.enriched_allocations.len()));
        parts.push(format!("conflicts={}", self.conflicts.len()));
        let unresolvable = self
            .leveled_schedule
            .all()
            .filter(|l| l.unresolvable)
            .count();
        if unresolvable > 0 {
            parts.push(format!("unresolvable={unresolvable}"));
        }
        parts.push(format!(
            "efficiency={:.1}",
            self.utilization_report.overall_efficiency
        ));
        parts.push(format!("cost={:.2}", self.cost_summary.total_cost));
        if !self.recommendations.is_empty() {
            parts.push(format!("recommendations={}", self.recommendations.len()));
        }
        if !self.diagnostics.is_empty() {
            parts.push(format!("warnings={}", self.diagnostics.len()));
        }
        parts.join(", ")
    }
}

/// Facade orchestrating the whole pipeline:
/// load -> validate -> cost -> utilization -> conflicts -> level -> recommend.
///
/// `run` holds a lock for its full duration: leveling mutates per-resource
/// timeline state in place, so passes over the same manager must serialize.
/// Distinct managers (distinct projects) are fully independent.
pub struct ResourceManager {
    config: AnalysisConfig,
    run_lock: Mutex<()>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            config,
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the full batch analysis over an in-memory snapshot. Data-level
    /// problems never fail the run; they accumulate in the bundle's
    /// diagnostics while processing continues with the valid records.
    pub fn run(&self, inputs: InputBundle) -> AnalysisBundle {
        let _guard = self.run_lock.lock();

        let mut diagnostics = Diagnostics::new();
        let store = AllocationStore::from_inputs(inputs, &mut diagnostics);

        let calculator = CostCalculator::new(self.config.working_hours_per_day);
        let (enriched_allocations, cost_summary) = calculator.enrich(&store, &mut diagnostics);

        let utilization_report = UtilizationAnalyzer::new().analyze(&store);
        let conflicts = ConflictDetector::new().detect(&store);

        let leveler = ResourceLeveler::new(self.config.leveling_horizon_days);
        let leveled_schedule = leveler.level(&store, &mut diagnostics);

        let recommendations =
            RecommendationEngine::new().recommend(&utilization_report, &conflicts);

        AnalysisBundle {
            enriched_allocations,
            utilization_report,
            conflicts,
            leveled_schedule,
            cost_summary,
            recommendations,
            diagnostics,
        }
    }

    /// File-to-file variant: read the input snapshot, run, publish the
    /// bundle atomically. Only I/O or serialization failures abort.
    pub fn run_file<P, Q>(&self, input: P, output: Q) -> SnapshotResult<AnalysisBundle>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let inputs = snapshot::load_inputs_from_json(input)?;
        let bundle = self.run(inputs);
        snapshot::write_json_atomic(&bundle, output)?;
        Ok(bundle)
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}
