use std::path::{Path, PathBuf};

use anyhow::Context;

use super::HistoryRecord;
use crate::assessment::Severity;

pub const HISTORY_CAPACITY: usize = 50;
pub const HISTORY_FILE: &str = "skinAnalysisHistory.json";

/// Newest-first list of past assessments kept in a single JSON file.
///
/// Every mutation re-reads the file, applies the change and writes the whole
/// list back. Concurrent writers are last-write-wins.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    records: Vec<HistoryRecord>,
}

impl HistoryStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = read_records(&path);
        Self { path, records }
    }

    pub fn open_in(dir: impl AsRef<Path>) -> Self {
        Self::open(dir.as_ref().join(HISTORY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn reload(&mut self) {
        self.records = read_records(&self.path);
    }

    /// Inserts at the front and returns whatever fell off the tail.
    pub fn append(&mut self, record: HistoryRecord) -> anyhow::Result<Vec<HistoryRecord>> {
        self.reload();
        self.records.insert(0, record);
        let evicted = if self.records.len() > HISTORY_CAPACITY {
            self.records.split_off(HISTORY_CAPACITY)
        } else {
            Vec::new()
        };
        self.flush()?;
        Ok(evicted)
    }

    pub fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        self.reload();
        let before = self.records.len();
        self.records.retain(|record| record.id() != id);
        if self.records.len() == before {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Drops every record and removes the backing file.
    pub fn clear(&mut self) -> anyhow::Result<usize> {
        self.reload();
        let removed = self.records.len();
        self.records.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("remove {}", self.path.display()));
            }
        }
        Ok(removed)
    }

    /// Case-insensitive condition substring match, optionally narrowed to one severity.
    pub fn search(&self, term: &str, severity: Option<Severity>) -> Vec<&HistoryRecord> {
        let needle = term.trim().to_lowercase();
        self.records
            .iter()
            .filter(|record| {
                needle.is_empty() || record.assessment.condition.to_lowercase().contains(&needle)
            })
            .filter(|record| severity.map_or(true, |wanted| record.assessment.severity == wanted))
            .collect()
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string(&self.records)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

fn read_records(path: &Path) -> Vec<HistoryRecord> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str::<Vec<HistoryRecord>>(&raw) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable history file: {err}");
            Vec::new()
        }
    }
}
