use crate::allocation::{Allocation, AllocationStatus};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::resource::{CostRecord, Resource, ResourceType};
use crate::snapshot::{AllocationRecord, CostRecordRow, InputBundle, ResourceRecord};
use crate::task_tree::{self, TaskIndex};
use crate::validation;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Immutable working snapshot for one analysis run.
///
/// Built once from the input bundle; every record that survives construction
/// has already passed shape validation and reference checks. Everything that
/// did not survive is described in the diagnostics passed to `from_inputs`.
pub struct AllocationStore {
    resources: BTreeMap<String, Resource>,
    allocations: Vec<Allocation>,
    cost_records: HashMap<String, Vec<CostRecord>>,
    tasks: TaskIndex,
}

impl AllocationStore {
    pub fn from_inputs(inputs: InputBundle, diagnostics: &mut Diagnostics) -> Self {
        let mut resources = BTreeMap::new();
        for record in &inputs.resources {
            match convert_resource(record) {
                Ok(resource) => {
                    if resources.contains_key(&resource.id) {
                        diagnostics.push(
                            DiagnosticKind::Validation,
                            resource.id.clone(),
                            format!("duplicate resource id {}, keeping first occurrence", resource.id),
                        );
                        continue;
                    }
                    resources.insert(resource.id.clone(), resource);
                }
                Err(message) => {
                    diagnostics.push(DiagnosticKind::Validation, record.id.clone(), message);
                }
            }
        }

        let mut cost_records: HashMap<String, Vec<CostRecord>> = HashMap::new();
        for row in &inputs.cost_records {
            match convert_cost_record(row) {
                Ok(record) => {
                    if !resources.contains_key(&record.resource_id) {
                        diagnostics.push(
                            DiagnosticKind::MissingReference,
                            record.resource_id.clone(),
                            format!("cost record references unknown resource {}", record.resource_id),
                        );
                        continue;
                    }
                    cost_records
                        .entry(record.resource_id.clone())
                        .or_default()
                        .push(record);
                }
                Err(message) => {
                    diagnostics.push(DiagnosticKind::Validation, row.resource_id.clone(), message);
                }
            }
        }

        let tasks = task_tree::flatten_task_tree(&inputs.tasks, diagnostics);

        let mut allocations: Vec<Allocation> = Vec::with_capacity(inputs.allocations.len());
        let mut seen_ids: BTreeMap<&str, ()> = BTreeMap::new();
        for record in &inputs.allocations {
            let allocation = match convert_allocation(record) {
                Ok(allocation) => allocation,
                Err(message) => {
                    diagnostics.push(DiagnosticKind::Validation, record.id.clone(), message);
                    continue;
                }
            };
            if seen_ids.insert(record.id.as_str(), ()).is_some() {
                diagnostics.push(
                    DiagnosticKind::Validation,
                    record.id.clone(),
                    format!("duplicate allocation id {}, keeping first occurrence", record.id),
                );
                continue;
            }
            if !resources.contains_key(&allocation.resource_id) {
                diagnostics.push(
                    DiagnosticKind::MissingReference,
                    allocation.id.clone(),
                    format!(
                        "allocation {} references unknown resource {}",
                        allocation.id, allocation.resource_id
                    ),
                );
                continue;
            }
            // Task references are only checkable when a task tree came along.
            if !tasks.is_empty() && !tasks.contains(&allocation.task_id) {
                diagnostics.push(
                    DiagnosticKind::MissingReference,
                    allocation.id.clone(),
                    format!(
                        "allocation {} references unknown task {}",
                        allocation.id, allocation.task_id
                    ),
                );
                continue;
            }
            allocations.push(allocation);
        }

        // The documented pipeline order: everything downstream iterates
        // allocations by (start_date, id).
        allocations.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));

        Self {
            resources,
            allocations,
            cost_records,
            tasks,
        }
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Allocations sorted by `(start_date, id)`.
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    /// Allocations grouped per resource, preserving the global sort within
    /// each group. Keyed and iterated in resource-id order.
    pub fn allocations_by_resource(&self) -> BTreeMap<&str, Vec<&Allocation>> {
        let mut groups: BTreeMap<&str, Vec<&Allocation>> = BTreeMap::new();
        for allocation in &self.allocations {
            groups
                .entry(allocation.resource_id.as_str())
                .or_default()
                .push(allocation);
        }
        groups
    }

    /// The cost record whose validity window covers `date`. When several
    /// cover it, the latest effective date wins.
    pub fn cost_record_for(&self, resource_id: &str, date: NaiveDate) -> Option<&CostRecord> {
        self.cost_records
            .get(resource_id)?
            .iter()
            .filter(|record| record.covers(date))
            .max_by_key(|record| record.effective_date)
    }

    pub fn tasks(&self) -> &TaskIndex {
        &self.tasks
    }
}

fn convert_resource(record: &ResourceRecord) -> Result<Resource, String> {
    let resource_type = if record.resource_type.trim().is_empty() {
        ResourceType::Human
    } else {
        ResourceType::from_str(record.resource_type.trim())
            .ok_or_else(|| format!("resource {} has unknown type '{}'", record.id, record.resource_type))?
    };

    let effective_date = validation::parse_optional_date(record.effective_date.as_deref())
        .map_err(|err| format!("resource {}: {}", record.id, err))?;
    let expiry_date = validation::parse_optional_date(record.expiry_date.as_deref())
        .map_err(|err| format!("resource {}: {}", record.id, err))?;

    let mut skills = record.skills.clone();
    skills.sort();
    skills.dedup();

    let resource = Resource {
        id: record.id.clone(),
        name: record.name.clone(),
        resource_type,
        capacity: record.capacity.unwrap_or(100.0),
        skills,
        hourly_cost: record.hourly_cost,
        daily_cost: record.daily_cost,
        currency: record.currency.clone().unwrap_or_else(|| "USD".to_string()),
        effective_date,
        expiry_date,
    };
    validation::validate_resource(&resource).map_err(|err| err.to_string())?;
    Ok(resource)
}

fn convert_cost_record(row: &CostRecordRow) -> Result<CostRecord, String> {
    if row.resource_id.trim().is_empty() {
        return Err("cost record requires a non-empty resource_id".to_string());
    }
    if !row.hourly_cost.is_finite() || row.hourly_cost < 0.0 {
        return Err(format!(
            "cost record for {} has invalid hourly_cost {}",
            row.resource_id, row.hourly_cost
        ));
    }
    let effective_date = validation::parse_optional_date(row.effective_date.as_deref())
        .map_err(|err| format!("cost record for {}: {}", row.resource_id, err))?;
    let expiry_date = validation::parse_optional_date(row.expiry_date.as_deref())
        .map_err(|err| format!("cost record for {}: {}", row.resource_id, err))?;
    if let (Some(effective), Some(expiry)) = (effective_date, expiry_date) {
        if effective > expiry {
            return Err(format!(
                "cost record for {} effective_date {} is after expiry_date {}",
                row.resource_id, effective, expiry
            ));
        }
    }
    Ok(CostRecord {
        resource_id: row.resource_id.clone(),
        hourly_cost: row.hourly_cost,
        daily_cost: row.daily_cost,
        currency: row.currency.clone().unwrap_or_else(|| "USD".to_string()),
        effective_date,
        expiry_date,
    })
}

fn convert_allocation(record: &AllocationRecord) -> Result<Allocation, String> {
    let start_date = validation::parse_date(&record.start_date)
        .map_err(|err| format!("allocation {}: {}", record.id, err))?;
    let end_date = validation::parse_date(&record.end_date)
        .map_err(|err| format!("allocation {}: {}", record.id, err))?;

    let status = match record.status.as_deref() {
        None => AllocationStatus::Planned,
        Some(raw) if raw.trim().is_empty() => AllocationStatus::Planned,
        Some(raw) => AllocationStatus::from_str(raw.trim())
            .ok_or_else(|| format!("allocation {} has unknown status '{}'", record.id, raw))?,
    };

    let allocation = Allocation {
        id: record.id.clone(),
        task_id: record.task_id.clone(),
        resource_id: record.resource_id.clone(),
        allocation_percent: record.allocation_percent,
        start_date,
        end_date,
        status,
        notes: record.notes.clone(),
    };
    validation::validate_allocation(&allocation).map_err(|err| err.to_string())?;
    Ok(allocation)
}
