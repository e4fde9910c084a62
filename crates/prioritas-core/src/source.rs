//! Read-only access to historical complaint records
//!
//! The surrounding application owns persistence. The engine only ever reads
//! complaints through [`ComplaintSource`] and never mutates what it gets back.

use crate::{Complaint, Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Data-access interface for complaint records
pub trait ComplaintSource: Send + Sync {
    /// All complaints known to the source
    fn complaints(&self) -> Result<Vec<Complaint>>;

    /// Only the complaints carrying a ground-truth priority
    fn labeled(&self) -> Result<Vec<Complaint>> {
        Ok(self
            .complaints()?
            .into_iter()
            .filter(Complaint::is_labeled)
            .collect())
    }
}

/// Source backed by a fixed in-memory batch
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<Complaint>,
}

impl InMemorySource {
    pub fn new(records: Vec<Complaint>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ComplaintSource for InMemorySource {
    fn complaints(&self) -> Result<Vec<Complaint>> {
        Ok(self.records.clone())
    }
}

/// Source reading a JSON array or YAML sequence of complaints from disk
///
/// The format is picked from the file extension: `.yaml`/`.yml` are parsed as
/// YAML, anything else as JSON. The file is re-read on every call.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_yaml(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
    }
}

impl ComplaintSource for FileSource {
    fn complaints(&self) -> Result<Vec<Complaint>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", self.path.display(), e),
            ))
        })?;

        let records: Vec<Complaint> = if self.is_yaml() {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        debug!(path = %self.path.display(), count = records.len(), "Loaded complaints");
        Ok(records)
    }
}

/// Write complaints as pretty JSON, the format [`FileSource`] reads by default
pub fn write_json(path: impl AsRef<Path>, records: &[Complaint]) -> Result<()> {
    let content = serde_json::to_string_pretty(records)?;
    std::fs::write(path, content)?;
    Ok(())
}
