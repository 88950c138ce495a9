//! Pure checks applied before any task mutation is accepted.
//!
//! Every function returns the first failing check as a [`ValidationError`];
//! its `Display` text is what the user gets to see.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

/// Upper bound on trimmed task text, inclusive.
pub const MAX_TEXT_LEN: usize = 100;

const REQUIRED_FIELDS: [&str; 4] = ["id", "text", "completed", "createdAt"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task text cannot be empty")]
    EmptyText,

    #[error("Task text cannot exceed {max} characters (got {len})", max = MAX_TEXT_LEN)]
    TextTooLong { len: usize },

    #[error("Task field `text` must be a string")]
    TextNotString,

    #[error("Task id must be a positive number")]
    InvalidId,

    #[error("Task record must be an object")]
    NotAnObject,

    #[error("Task record is missing field `{0}`")]
    MissingField(&'static str),

    #[error("Task field `completed` must be a boolean")]
    CompletedNotBoolean,

    #[error("Task field `createdAt` must be a valid date")]
    InvalidCreatedAt,
}

pub type ValidationResult = Result<(), ValidationError>;

pub fn validate_text(raw: &str) -> ValidationResult {
    let len = raw.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::EmptyText);
    }
    if len > MAX_TEXT_LEN {
        return Err(ValidationError::TextTooLong { len });
    }
    Ok(())
}

/// Valid iff `id` is a positive integer that fits a task id (`i64`).
///
/// Stricter than "positive number": `1.5` and `1e20` are rejected, since
/// neither can be stored as a `TaskId`.
pub fn validate_id(id: &Value) -> ValidationResult {
    match id.as_i64() {
        Some(n) if n > 0 => Ok(()),
        _ => Err(ValidationError::InvalidId),
    }
}

/// Shape check for an imported or loaded record.
///
/// Field presence is checked for all fields before any value check.
pub fn validate_task_record(record: &Value) -> ValidationResult {
    let object = record.as_object().ok_or(ValidationError::NotAnObject)?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Err(ValidationError::MissingField(*missing));
    }

    match &object["text"] {
        Value::String(text) => validate_text(text)?,
        _ => return Err(ValidationError::TextNotString),
    }
    validate_id(&object["id"])?;

    if !object["completed"].is_boolean() {
        return Err(ValidationError::CompletedNotBoolean);
    }

    match &object["createdAt"] {
        Value::String(created_at) if is_valid_timestamp(created_at) => Ok(()),
        _ => Err(ValidationError::InvalidCreatedAt),
    }
}

fn is_valid_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
