use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an allocation.
///
/// Legal moves: `planned -> active -> completed` (forward only), any
/// non-terminal state `-> cancelled`, and `active <-> on_hold`.
/// `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Planned,
    Active,
    Completed,
    Cancelled,
    OnHold,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Planned => "planned",
            AllocationStatus::Active => "active",
            AllocationStatus::Completed => "completed",
            AllocationStatus::Cancelled => "cancelled",
            AllocationStatus::OnHold => "on_hold",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "planned" => Some(AllocationStatus::Planned),
            "active" => Some(AllocationStatus::Active),
            "completed" => Some(AllocationStatus::Completed),
            "cancelled" => Some(AllocationStatus::Cancelled),
            "on_hold" => Some(AllocationStatus::OnHold),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AllocationStatus::Completed | AllocationStatus::Cancelled)
    }

    pub fn can_transition(&self, to: AllocationStatus) -> bool {
        use AllocationStatus::*;
        if *self == to {
            return false;
        }
        match (*self, to) {
            (Planned, Active) => true,
            (Active, Completed) => true,
            (Active, OnHold) => true,
            (OnHold, Active) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusTransitionError {
    pub from: AllocationStatus,
    pub to: AllocationStatus,
}

impl fmt::Display for StatusTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal allocation status transition {} -> {}",
            self.from.as_str(),
            self.to.as_str()
        )
    }
}

impl std::error::Error for StatusTransitionError {}

/// Assignment of a percentage of a resource's capacity to a task over a
/// date range. Owned by the external planner; this subsystem reads it and
/// only ever derives new data from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    pub task_id: String,
    pub resource_id: String,
    /// Percent of the resource committed, in [0, 100].
    pub allocation_percent: f64,
    /// Inclusive date range, `start_date <= end_date`.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: AllocationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Allocation {
    pub fn new(
        id: impl Into<String>,
        task_id: impl Into<String>,
        resource_id: impl Into<String>,
        allocation_percent: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            task_id: task_id.into(),
            resource_id: resource_id.into(),
            allocation_percent,
            start_date,
            end_date,
            status: AllocationStatus::Planned,
            notes: None,
        }
    }

    /// Inclusive day count between start and end.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn transition(&mut self, to: AllocationStatus) -> Result<(), StatusTransitionError> {
        if !self.status.can_transition(to) {
            return Err(StatusTransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Whether the allocation consumes capacity for analysis purposes.
    /// Cancelled allocations are invisible to the whole pipeline.
    pub fn counts_toward_load(&self) -> bool {
        self.status != AllocationStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn duration_is_inclusive() {
        let alloc = Allocation::new("a1", "t1", "r1", 50.0, d(2025, 1, 1), d(2025, 1, 5));
        assert_eq!(alloc.duration_days(), 5);
    }

    #[test]
    fn forward_transitions_allowed() {
        let mut alloc = Allocation::new("a1", "t1", "r1", 50.0, d(2025, 1, 1), d(2025, 1, 5));
        alloc.transition(AllocationStatus::Active).unwrap();
        alloc.transition(AllocationStatus::OnHold).unwrap();
        alloc.transition(AllocationStatus::Active).unwrap();
        alloc.transition(AllocationStatus::Completed).unwrap();
        assert!(alloc.status.is_terminal());
    }

    #[test]
    fn completed_cannot_move() {
        let mut alloc = Allocation::new("a1", "t1", "r1", 50.0, d(2025, 1, 1), d(2025, 1, 5));
        alloc.transition(AllocationStatus::Active).unwrap();
        alloc.transition(AllocationStatus::Completed).unwrap();
        assert!(alloc.transition(AllocationStatus::Cancelled).is_err());
        assert!(alloc.transition(AllocationStatus::Active).is_err());
    }

    #[test]
    fn any_non_terminal_state_cancels() {
        for status in [
            AllocationStatus::Planned,
            AllocationStatus::Active,
            AllocationStatus::OnHold,
        ] {
            assert!(status.can_transition(AllocationStatus::Cancelled));
        }
        assert!(!AllocationStatus::Cancelled.can_transition(AllocationStatus::Cancelled));
    }

    #[test]
    fn skipping_active_is_rejected() {
        let mut alloc = Allocation::new("a1", "t1", "r1", 50.0, d(2025, 1, 1), d(2025, 1, 5));
        assert!(alloc.transition(AllocationStatus::Completed).is_err());
        assert!(alloc.transition(AllocationStatus::OnHold).is_err());
    }
}
