use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};

pub type TaskId = i64;

static LAST_ISSUED_ID: AtomicI64 = AtomicI64::new(0);

/// One entry of the task list.
///
/// The serialized shape is the persisted/exported record:
/// `{"id": 1, "text": "...", "completed": false, "createdAt": "..."}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: String, // ISO-8601, never rewritten after creation
}

impl Task {
    /// Creates an incomplete task stamped with the current time.
    ///
    /// Callers are expected to have validated `text` already.
    pub fn create(text: &str) -> Self {
        let now = Utc::now();
        Self::stamped(text, issue_id(now.timestamp_millis()), now)
    }

    /// Like [`Task::create`], but the id is greater than `floor`.
    ///
    /// Returns `None` when `floor` is already `TaskId::MAX`.
    pub fn create_after(text: &str, floor: TaskId) -> Option<Self> {
        let now = Utc::now();
        let id = issue_id(now.timestamp_millis()).max(floor.checked_add(1)?);
        Some(Self::stamped(text, id, now))
    }

    fn stamped(text: &str, id: TaskId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.trim().to_string(),
            completed: false,
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    pub fn complete(&mut self) {
        self.completed = true;
    }

    pub fn uncomplete(&mut self) {
        self.completed = false;
    }

    /// Stores the trimmed text as-is. Length is the caller's concern.
    pub fn update_text(&mut self, new_text: &str) {
        self.text = new_text.trim().to_string();
    }

    pub fn to_record(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "text": self.text,
            "completed": self.completed,
            "createdAt": self.created_at,
        })
    }

    /// Rebuilds a task from a record exactly as given.
    pub fn from_record(record: Value) -> serde_json::Result<Self> {
        serde_json::from_value(record)
    }
}

// Timestamp based, bumped past the last issued id so that two tasks
// created within the same millisecond never share an id.
fn issue_id(timestamp_ms: i64) -> TaskId {
    let mut last = LAST_ISSUED_ID.load(Ordering::Relaxed);
    loop {
        let next = timestamp_ms.max(last.saturating_add(1));
        match LAST_ISSUED_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sets_defaults() {
        let task = Task::create("Buy milk");
        assert!(task.id > 0);
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
        assert!(chrono::DateTime::parse_from_rfc3339(&task.created_at).is_ok());
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let first = Task::create("a");
        let second = Task::create("b");
        let third = Task::create("c");
        assert!(first.id < second.id);
        assert!(second.id < third.id);
    }

    #[test]
    fn create_after_respects_floor() {
        let floor = Utc::now().timestamp_millis() + 1_000_000;
        let task = Task::create_after("later", floor).unwrap();
        assert!(task.id > floor);
    }

    #[test]
    fn create_after_max_floor_has_no_id_left() {
        assert_eq!(Task::create_after("none", TaskId::MAX), None);
        let task = Task::create_after("last", TaskId::MAX - 1).unwrap();
        assert_eq!(task.id, TaskId::MAX);
        assert!(Task::create("still fine").id < TaskId::MAX);
    }

    #[test]
    fn toggle_returns_new_value_and_twice_restores() {
        let mut task = Task::create("flip");
        assert!(task.toggle());
        assert!(!task.toggle());
        assert!(!task.completed);
    }

    #[test]
    fn complete_and_uncomplete_are_explicit() {
        let mut task = Task::create("set");
        task.complete();
        task.complete();
        assert!(task.completed);
        task.uncomplete();
        assert!(!task.completed);
    }

    #[test]
    fn update_text_trims_without_length_check() {
        let mut task = Task::create("old");
        let long = "x".repeat(150);
        task.update_text(&format!("  {long} "));
        assert_eq!(task.text, long);
    }

    #[test]
    fn record_uses_camel_case_created_at() {
        let task = Task::create("shape");
        let record = task.to_record();
        assert_eq!(record["createdAt"], Value::String(task.created_at.clone()));
        assert_eq!(record["completed"], Value::Bool(false));
        assert!(record.get("created_at").is_none());
    }

    #[test]
    fn from_record_keeps_fields_verbatim() {
        let record = serde_json::json!({
            "id": 42,
            "text": "  spaced  ",
            "completed": true,
            "createdAt": "2024-01-02T03:04:05.000Z",
        });
        let task = Task::from_record(record).unwrap();
        assert_eq!(task.id, 42);
        assert_eq!(task.text, "  spaced  ");
        assert!(task.completed);
        assert_eq!(task.created_at, "2024-01-02T03:04:05.000Z");
        assert_eq!(Task::from_record(task.to_record()).unwrap(), task);
    }
}
