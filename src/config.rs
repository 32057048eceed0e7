use serde::{Deserialize, Serialize};

/// Knobs for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hours of work one full day of allocation represents.
    pub working_hours_per_day: f64,
    /// How far past its requested start the leveler may push an allocation
    /// before marking it unresolvable.
    pub leveling_horizon_days: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            working_hours_per_day: 8.0,
            leveling_horizon_days: 180,
        }
    }
}
