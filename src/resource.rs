use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Classification of a resource. Determines nothing algorithmically today,
/// but rides along into every report so consumers can group by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Human,
    Equipment,
    Material,
    Software,
    Facility,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Human => "human",
            ResourceType::Equipment => "equipment",
            ResourceType::Material => "material",
            ResourceType::Software => "software",
            ResourceType::Facility => "facility",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "human" => Some(ResourceType::Human),
            "equipment" => Some(ResourceType::Equipment),
            "material" => Some(ResourceType::Material),
            "software" => Some(ResourceType::Software),
            "facility" => Some(ResourceType::Facility),
            _ => None,
        }
    }
}

/// A resource that allocations draw capacity from (person, machine, room).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub resource_type: ResourceType,
    /// Available capacity in percent. Must be positive; defaults to 100.
    pub capacity: f64,
    /// Skill tags, deduplicated at load time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// Inline hourly rate, used when no cost record covers an allocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_cost: Option<f64>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type,
            capacity: 100.0,
            skills: Vec::new(),
            hourly_cost: None,
            daily_cost: None,
            currency: "USD".to_string(),
            effective_date: None,
            expiry_date: None,
        }
    }

    pub fn has_any_skill(&self, required: &[String]) -> bool {
        required.iter().any(|skill| self.skills.iter().any(|s| s == skill))
    }
}

/// Rate card entry for a resource, valid within an optional date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub resource_id: String,
    pub hourly_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_cost: Option<f64>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

impl CostRecord {
    /// Whether this record's validity window contains the given date.
    /// An open bound never excludes.
    pub fn covers(&self, date: NaiveDate) -> bool {
        if let Some(effective) = self.effective_date {
            if date < effective {
                return false;
            }
        }
        if let Some(expiry) = self.expiry_date {
            if date > expiry {
                return false;
            }
        }
        true
    }
}
