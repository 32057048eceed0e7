use crate::task_tree::TaskRecord;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum SnapshotError {
    Io(io::Error),
    Serialization(SerdeJsonError),
    InvalidData(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Io(err) => write!(f, "io error: {err}"),
            SnapshotError::Serialization(err) => write!(f, "serialization error: {err}"),
            SnapshotError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<io::Error> for SnapshotError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SerdeJsonError> for SnapshotError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Loose wire row for a resource. Dates stay strings here so one malformed
/// record quarantines itself instead of failing the whole snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Missing or empty defaults to `human`.
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub capacity: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub hourly_cost: Option<f64>,
    #[serde(default)]
    pub daily_cost: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

/// Loose wire row for an allocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub id: String,
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub allocation_percent: f64,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    /// Missing defaults to `planned`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Loose wire row for a rate card entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostRecordRow {
    pub resource_id: String,
    #[serde(default)]
    pub hourly_cost: f64,
    #[serde(default)]
    pub daily_cost: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

/// The read-only input snapshot handed over by the persistence collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputBundle {
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
    #[serde(default)]
    pub allocations: Vec<AllocationRecord>,
    #[serde(default)]
    pub cost_records: Vec<CostRecordRow>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

pub fn load_inputs_from_json<P: AsRef<Path>>(path: P) -> SnapshotResult<InputBundle> {
    read_json(path)
}

pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> SnapshotResult<T> {
    let file = File::open(path)?;
    let value = serde_json::from_reader(file)?;
    Ok(value)
}

/// Write JSON via a temporary sibling file and rename, so a failed or
/// concurrent run never leaves a partially written bundle at the published
/// path.
pub fn write_json_atomic<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> SnapshotResult<()> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .ok_or_else(|| SnapshotError::InvalidData(format!("invalid output path {}", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let file = File::create(&tmp_path)?;
    if let Err(err) = serde_json::to_writer_pretty(&file, value) {
        drop(file);
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    file.sync_all()?;
    drop(file);
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
