use crate::allocation::Allocation;
use crate::resource::Resource;
use chrono::NaiveDate;
use std::fmt;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|err| ValidationError::new(format!("invalid date '{input}': {err}")))
}

pub fn parse_optional_date(input: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match input {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(raw).map(Some),
    }
}

pub fn validate_resource(resource: &Resource) -> Result<(), ValidationError> {
    if resource.id.trim().is_empty() {
        return Err(ValidationError::new("resource requires a non-empty id"));
    }
    if !resource.capacity.is_finite() || resource.capacity <= EPSILON {
        return Err(ValidationError::new(format!(
            "resource {} has non-positive capacity {}",
            resource.id, resource.capacity
        )));
    }
    if let Some(rate) = resource.hourly_cost {
        if !rate.is_finite() || rate < -EPSILON {
            return Err(ValidationError::new(format!(
                "resource {} has invalid hourly_cost {}",
                resource.id, rate
            )));
        }
    }
    if let (Some(effective), Some(expiry)) = (resource.effective_date, resource.expiry_date) {
        if effective > expiry {
            return Err(ValidationError::new(format!(
                "resource {} effective_date {} is after expiry_date {}",
                resource.id, effective, expiry
            )));
        }
    }
    Ok(())
}

pub fn validate_allocation(allocation: &Allocation) -> Result<(), ValidationError> {
    if allocation.id.trim().is_empty() {
        return Err(ValidationError::new("allocation requires a non-empty id"));
    }
    if allocation.resource_id.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "allocation {} requires a non-empty resource_id",
            allocation.id
        )));
    }
    let pct = allocation.allocation_percent;
    if !pct.is_finite() || pct < -EPSILON || pct > 100.0 + EPSILON {
        return Err(ValidationError::new(format!(
            "allocation {} has allocation_percent {} outside [0, 100]",
            allocation.id, pct
        )));
    }
    if allocation.start_date > allocation.end_date {
        return Err(ValidationError::new(format!(
            "allocation {} start_date {} is after end_date {}",
            allocation.id, allocation.start_date, allocation.end_date
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut resource = Resource::new("r1", "Rig", ResourceType::Equipment);
        resource.capacity = 0.0;
        assert!(validate_resource(&resource).is_err());
    }

    #[test]
    fn rejects_percent_above_hundred() {
        let alloc = Allocation::new("a1", "t1", "r1", 120.0, d(2025, 1, 1), d(2025, 1, 5));
        assert!(validate_allocation(&alloc).is_err());
    }

    #[test]
    fn rejects_inverted_dates() {
        let alloc = Allocation::new("a1", "t1", "r1", 50.0, d(2025, 1, 5), d(2025, 1, 1));
        assert!(validate_allocation(&alloc).is_err());
    }

    #[test]
    fn accepts_boundary_percents() {
        let zero = Allocation::new("a1", "t1", "r1", 0.0, d(2025, 1, 1), d(2025, 1, 1));
        let full = Allocation::new("a2", "t1", "r1", 100.0, d(2025, 1, 1), d(2025, 1, 1));
        assert!(validate_allocation(&zero).is_ok());
        assert!(validate_allocation(&full).is_ok());
    }
}
