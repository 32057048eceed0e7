use serde::{Deserialize, Serialize};

/// Category of a non-fatal finding recorded during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Validation,
    MissingReference,
    CircularDependency,
    MissingCostRecord,
    UnresolvableAllocation,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Validation => "validation",
            DiagnosticKind::MissingReference => "missing_reference",
            DiagnosticKind::CircularDependency => "circular_dependency",
            DiagnosticKind::MissingCostRecord => "missing_cost_record",
            DiagnosticKind::UnresolvableAllocation => "unresolvable_allocation",
        }
    }
}

/// One skipped or degraded record, with the id it concerns and the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Id of the record the finding concerns (allocation, resource, or task).
    pub subject: String,
    pub message: String,
}

/// Accumulator for everything that went wrong without aborting the run.
/// Data-level problems land here; only I/O failures are surfaced as errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.warnings.push(Diagnostic {
            kind,
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}
