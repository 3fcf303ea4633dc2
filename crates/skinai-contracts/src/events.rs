use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub const ASSESSMENT_STARTED: &str = "assessment_started";
pub const ASSESSMENT_COMPLETED: &str = "assessment_completed";
pub const ASSESSMENT_FAILED: &str = "assessment_failed";
pub const CHAT_COMPLETED: &str = "chat_completed";
pub const CHAT_FAILED: &str = "chat_failed";
pub const HISTORY_APPENDED: &str = "history_appended";
pub const HISTORY_DELETED: &str = "history_deleted";
pub const HISTORY_CLEARED: &str = "history_cleared";

const RESERVED_KEYS: [&str; 3] = ["type", "session_id", "ts"];

/// Append-only JSONL journal of assessment, chat and history activity.
///
/// Every line starts with `type`, `session_id` and `ts`; fields supplied by
/// the caller follow and can never replace those three. Image bytes are never
/// written here; call sites record a digest instead.
///
/// Clones share one file handle, opened on first write.
#[derive(Debug, Clone)]
pub struct EventWriter {
    shared: Arc<Journal>,
}

#[derive(Debug)]
struct Journal {
    path: PathBuf,
    session_id: String,
    file: Mutex<Option<File>>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Journal {
                path: path.into(),
                session_id: session_id.into(),
                file: Mutex::new(None),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn session_id(&self) -> &str {
        &self.shared.session_id
    }

    /// Writes one line and returns it. `fields` other than a JSON object are
    /// stored under `data`.
    pub fn emit(&self, event_type: &str, fields: Value) -> anyhow::Result<Value> {
        let mut line = Map::new();
        line.insert("type".to_string(), Value::String(event_type.to_string()));
        line.insert(
            "session_id".to_string(),
            Value::String(self.shared.session_id.clone()),
        );
        line.insert("ts".to_string(), Value::String(now_utc_iso()));
        match fields {
            Value::Object(extra) => {
                for (key, value) in extra {
                    if !RESERVED_KEYS.contains(&key.as_str()) {
                        line.insert(key, value);
                    }
                }
            }
            Value::Null => {}
            other => {
                line.insert("data".to_string(), other);
            }
        }
        let line = Value::Object(line);
        let mut encoded = serde_json::to_vec(&line)?;
        encoded.push(b'\n');

        let mut slot = self
            .shared
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("journal lock poisoned"))?;
        if slot.is_none() {
            *slot = Some(self.open()?);
        }
        if let Some(file) = slot.as_mut() {
            file.write_all(&encoded)
                .with_context(|| format!("append to {}", self.shared.path.display()))?;
        }
        Ok(line)
    }

    /// Like `emit`, but a failed write is only logged.
    pub fn record(&self, event_type: &str, fields: Value) {
        if let Err(err) = self.emit(event_type, fields) {
            tracing::warn!(
                event = event_type,
                path = %self.shared.path.display(),
                "journal write failed: {err:#}"
            );
        }
    }

    fn open(&self) -> anyhow::Result<File> {
        if let Some(parent) = self.shared.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.shared.path)
            .with_context(|| format!("open {}", self.shared.path.display()))
    }
}

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
