//! Terminal task list: add, complete, edit and delete short text tasks,
//! persisted as one JSON document in the data directory.
//!
//! Control flow for every user action: the controller validates and
//! mutates its collection, persists it, then asks the renderer to rebuild
//! the rows; rows turn interactions back into [`Command`]s by task id.

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod render;
pub mod storage;
pub mod task;
pub mod ui;
pub mod validator;

pub use app::App;
pub use config::Config;
pub use controller::{Command, Focus, Statistics, TaskController};
pub use error::{AppError, Result};
pub use notifier::{Notification, NotificationKind, Notifier};
pub use render::{Renderer, RowEvent, RowHandlers, TaskRow, View};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, TaskStorage, TASKS_KEY};
pub use task::{Task, TaskId};
pub use validator::{
    validate_id, validate_task_record, validate_text, ValidationError, ValidationResult,
    MAX_TEXT_LEN,
};
