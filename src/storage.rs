//! Best-effort persistence: the whole collection is one JSON array under a
//! single key, and store failures are logged, never returned.

use crate::task::Task;
use crate::validator::validate_task_record;
use log::{error, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key under which the collection is stored.
pub const TASKS_KEY: &str = "tasks";

const PROBE_KEY: &str = "__storage_probe__";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Store is unavailable")]
    Unavailable,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Minimal string key-value store, the local-storage of this app.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store. Counts writes and can be switched to fail.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    writes: usize,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails, like storage disabled by the host.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Reads and writes the task collection through a [`KeyValueStore`].
#[derive(Debug)]
pub struct TaskStorage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> TaskStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes the whole collection. Failures are logged and dropped.
    pub fn save(&mut self, tasks: &[Task]) {
        if let Err(err) = self.try_save(tasks) {
            error!(
                "event=tasks_save module=storage status=error count={} error={}",
                tasks.len(),
                err
            );
        }
    }

    fn try_save(&mut self, tasks: &[Task]) -> StorageResult<()> {
        let records: Vec<Value> = tasks.iter().map(Task::to_record).collect();
        let data = serde_json::to_string(&records)?;
        self.store.set(TASKS_KEY, &data)
    }

    /// Loads the collection, or an empty one when absent or unreadable.
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => tasks,
            Err(err) => {
                error!("event=tasks_load module=storage status=error error={}", err);
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> StorageResult<Vec<Task>> {
        let Some(data) = self.store.get(TASKS_KEY)? else {
            return Ok(Vec::new());
        };
        let records = match serde_json::from_str::<Value>(&data)? {
            Value::Array(records) => records,
            other => {
                warn!(
                    "event=tasks_load module=storage status=degraded reason=not_an_array kind={}",
                    json_kind(&other)
                );
                return Ok(Vec::new());
            }
        };

        let total = records.len();
        let mut tasks = Vec::with_capacity(total);
        for (index, record) in records.into_iter().enumerate() {
            if let Err(err) = validate_task_record(&record) {
                warn!(
                    "event=task_record_dropped module=storage status=degraded index={} reason=\"{}\"",
                    index, err
                );
                continue;
            }
            tasks.push(Task::from_record(record)?);
        }
        info!(
            "event=tasks_load module=storage status=ok loaded={} dropped={}",
            tasks.len(),
            total - tasks.len()
        );
        Ok(tasks)
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.store.remove(TASKS_KEY) {
            error!("event=tasks_clear module=storage status=error error={}", err);
        }
    }

    /// Probes writability with a throwaway write/remove cycle.
    pub fn is_available(&mut self) -> bool {
        let probe = self
            .store
            .set(PROBE_KEY, PROBE_KEY)
            .and_then(|()| self.store.remove(PROBE_KEY));
        match probe {
            Ok(()) => true,
            Err(err) => {
                warn!("event=storage_probe module=storage status=unavailable error={}", err);
                false
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_from_empty_store_is_empty() {
        let storage = TaskStorage::new(MemoryStore::new());
        assert!(storage.load().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let mut storage = TaskStorage::new(MemoryStore::new());
        let mut first = Task::create("first");
        first.complete();
        let second = Task::create("second");
        storage.save(&[first.clone(), second.clone()]);

        assert_eq!(storage.load(), vec![first, second]);
        assert_eq!(storage.store().writes(), 1);
    }

    #[test]
    fn saved_document_is_a_json_array_of_records() {
        let mut storage = TaskStorage::new(MemoryStore::new());
        let task = Task::create("shape");
        storage.save(std::slice::from_ref(&task));

        let raw = storage.store().raw(TASKS_KEY).unwrap();
        let parsed: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, json!([task.to_record()]));
    }

    #[test]
    fn corrupt_document_loads_as_empty() {
        let storage = TaskStorage::new(MemoryStore::with_entry(TASKS_KEY, "{not json"));
        assert!(storage.load().is_empty());

        let storage = TaskStorage::new(MemoryStore::with_entry(TASKS_KEY, r#"{"id": 1}"#));
        assert!(storage.load().is_empty());
    }

    #[test]
    fn invalid_records_are_dropped_valid_ones_kept() {
        let data = json!([
            {"id": 1, "text": "kept", "completed": false, "createdAt": "2024-01-01T00:00:00Z"},
            {"id": 2, "completed": false, "createdAt": "2024-01-01T00:00:00Z"},
            {"id": 3, "text": "bad flag", "completed": "no", "createdAt": "2024-01-01T00:00:00Z"},
            {"id": 4, "text": "also kept", "completed": true, "createdAt": "2024-01-02"},
        ])
        .to_string();
        let storage = TaskStorage::new(MemoryStore::with_entry(TASKS_KEY, &data));

        let texts: Vec<String> = storage.load().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["kept", "also kept"]);
    }

    #[test]
    fn unavailable_store_is_absorbed() {
        let mut storage = TaskStorage::new(MemoryStore::unavailable());
        storage.save(&[Task::create("lost")]);
        assert!(storage.load().is_empty());
        storage.clear();
        assert!(!storage.is_available());
    }

    #[test]
    fn clear_removes_the_key_and_availability_check_leaves_nothing_behind() {
        let mut storage = TaskStorage::new(MemoryStore::new());
        storage.save(&[Task::create("gone")]);
        storage.clear();
        assert!(storage.store().raw(TASKS_KEY).is_none());

        assert!(storage.is_available());
        assert!(storage.store().raw(PROBE_KEY).is_none());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let store = FileStore::new("unused");
        assert!(matches!(
            store.get("../escape"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
