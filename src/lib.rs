pub mod allocation;
pub mod config;
pub mod conflict;
pub mod cost;
pub mod diagnostics;
pub mod facade;
pub mod leveling;
pub mod recommend;
pub mod resource;
pub mod snapshot;
pub mod store;
pub mod task_tree;
pub mod utilization;
pub(crate) mod validation;

pub use allocation::{Allocation, AllocationStatus, StatusTransitionError};
pub use config::AnalysisConfig;
pub use conflict::{Conflict, ConflictDetector, ConflictSeverity, ConflictType, resolution_order};
pub use cost::{CostCalculator, CostSummary, EnrichedAllocation};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use facade::{AnalysisBundle, ResourceManager};
pub use leveling::{CapacityTimeline, LeveledAllocation, LeveledSchedule, ResourceLeveler};
pub use recommend::{Recommendation, RecommendationEngine};
pub use resource::{CostRecord, Resource, ResourceType};
pub use snapshot::{
    AllocationRecord, CostRecordRow, InputBundle, ResourceRecord, SnapshotError,
    load_inputs_from_json, write_json_atomic,
};
pub use store::AllocationStore;
pub use task_tree::{TaskIndex, TaskMeta, TaskRecord, flatten_task_tree};
pub use utilization::{
    ResourceUtilization, UtilizationAnalyzer, UtilizationBand, UtilizationReport,
};
