//! Owner of the task collection. Accepted mutations are persisted, then
//! re-rendered; rejected ones change nothing and write nothing.

use crate::error::AppError;
use crate::notifier::{NotificationKind, Notifier};
use crate::render::{Renderer, RowHandlers, View};
use crate::storage::{KeyValueStore, TaskStorage};
use crate::task::{Task, TaskId};
use crate::validator::{validate_task_record, validate_text, MAX_TEXT_LEN};
use log::{info, warn};
use serde_json::Value;

const ROW_HANDLERS: RowHandlers = RowHandlers {
    on_toggle: Command::Toggle,
    on_delete: Command::Delete,
};

/// A user intent, as produced by rows and key bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Toggle(TaskId),
    Delete(TaskId),
    Update(TaskId, String),
    ClearCompleted,
    ClearAll,
}

/// Derived counts, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub completion_rate: f64,
}

impl Statistics {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let completion_rate = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total,
            completed,
            incomplete: total - completed,
            completion_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    List,
}

pub struct TaskController<S: KeyValueStore> {
    tasks: Vec<Task>,
    storage: TaskStorage<S>,
    renderer: Renderer,
    notifier: Notifier,
    input: String,
    editing: Option<TaskId>,
    focus: Focus,
}

impl<S: KeyValueStore> TaskController<S> {
    /// Loads the persisted collection and renders it.
    pub fn start(store: S, notifier: Notifier) -> Self {
        let storage = TaskStorage::new(store);
        let tasks = storage.load();
        info!(
            "event=controller_start module=controller status=ok tasks={}",
            tasks.len()
        );
        let mut controller = Self {
            tasks,
            storage,
            renderer: Renderer::new(),
            notifier,
            input: String::new(),
            editing: None,
            focus: Focus::Input,
        };
        controller.render();
        controller
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub fn view(&self) -> &View {
        self.renderer.view()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn storage(&self) -> &TaskStorage<S> {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut TaskStorage<S> {
        &mut self.storage
    }

    pub fn stats(&self) -> Statistics {
        Statistics::from_tasks(&self.tasks)
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Add(text) => {
                self.add_task(&text);
            }
            Command::Toggle(id) => self.toggle_task(id),
            Command::Delete(id) => self.delete_task(id),
            Command::Update(id, text) => {
                self.update_task(id, &text);
            }
            Command::ClearCompleted => self.clear_completed(),
            Command::ClearAll => self.clear_all(),
        }
    }

    pub fn add_task(&mut self, raw_text: &str) -> bool {
        if let Err(err) = validate_text(raw_text) {
            self.notifier.show(err.to_string(), NotificationKind::Error);
            return false;
        }

        let floor = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let Some(task) = Task::create_after(raw_text.trim(), floor) else {
            warn!(
                "event=task_add module=controller status=rejected reason=id_exhausted floor={}",
                floor
            );
            self.notifier.show(
                "No task id left: remove tasks with very large ids first",
                NotificationKind::Error,
            );
            return false;
        };
        info!("event=task_add module=controller status=ok id={}", task.id);
        self.tasks.push(task);
        self.commit();

        self.input.clear();
        self.focus = Focus::Input;
        self.notifier.show("Task added", NotificationKind::Success);
        true
    }

    pub fn toggle_task(&mut self, id: TaskId) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        let completed = task.toggle();
        info!(
            "event=task_toggle module=controller status=ok id={} completed={}",
            id, completed
        );
        self.commit();
    }

    pub fn delete_task(&mut self, id: TaskId) {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            return;
        };
        self.tasks.remove(index);
        if self.editing == Some(id) {
            self.cancel_edit();
        }
        info!("event=task_delete module=controller status=ok id={}", id);
        self.commit();
        self.notifier.show("Task deleted", NotificationKind::Info);
    }

    pub fn update_task(&mut self, id: TaskId, new_text: &str) -> bool {
        if let Err(err) = validate_text(new_text) {
            self.notifier.show(err.to_string(), NotificationKind::Error);
            return false;
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.update_text(new_text);
        info!("event=task_update module=controller status=ok id={}", id);
        self.commit();
        true
    }

    pub fn clear_all(&mut self) {
        let removed = self.tasks.len();
        self.tasks.clear();
        self.cancel_edit();
        info!(
            "event=tasks_clear module=controller status=ok scope=all removed={}",
            removed
        );
        self.commit();
        self.notifier.show("All tasks cleared", NotificationKind::Info);
    }

    pub fn clear_completed(&mut self) {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        if let Some(id) = self.editing {
            if !self.tasks.iter().any(|t| t.id == id) {
                self.cancel_edit();
            }
        }
        let removed = before - self.tasks.len();
        info!(
            "event=tasks_clear module=controller status=ok scope=completed removed={}",
            removed
        );
        self.commit();
        self.notifier.show(
            format!("Cleared {removed} completed task(s)"),
            NotificationKind::Info,
        );
    }

    /// Pretty-printed JSON array in the persisted record shape.
    pub fn export_tasks(&self) -> serde_json::Result<String> {
        let records: Vec<Value> = self.tasks.iter().map(Task::to_record).collect();
        serde_json::to_string_pretty(&records)
    }

    /// Same collection as `id,text,completed,createdAt` CSV rows.
    pub fn export_csv(&self) -> Result<String, AppError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["id", "text", "completed", "createdAt"])?;
        for task in &self.tasks {
            writer.write_record([
                task.id.to_string(),
                task.text.clone(),
                task.completed.to_string(),
                task.created_at.clone(),
            ])?;
        }
        let bytes = writer.into_inner().map_err(|err| err.into_error())?;
        String::from_utf8(bytes).map_err(|err| AppError::Export(err.to_string()))
    }

    /// Replaces the whole collection, or changes nothing at all.
    pub fn import_tasks(&mut self, json: &str) -> bool {
        match Self::parse_import(json) {
            Ok(tasks) => {
                let count = tasks.len();
                self.tasks = tasks;
                self.cancel_edit();
                info!(
                    "event=tasks_import module=controller status=ok count={}",
                    count
                );
                self.commit();
                self.notifier.show(
                    format!("Imported {count} task(s)"),
                    NotificationKind::Success,
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=tasks_import module=controller status=rejected error=\"{}\"",
                    err
                );
                self.notifier
                    .show(format!("Import failed: {err}"), NotificationKind::Error);
                false
            }
        }
    }

    fn parse_import(json: &str) -> Result<Vec<Task>, AppError> {
        let records = match serde_json::from_str::<Value>(json)? {
            Value::Array(records) => records,
            _ => return Err(AppError::NotAnArray),
        };
        for record in &records {
            validate_task_record(record)?;
        }
        records
            .into_iter()
            .map(|record| Task::from_record(record).map_err(AppError::from))
            .collect()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.chars().take(MAX_TEXT_LEN).collect();
    }

    /// Appends a character unless the field is already full.
    pub fn push_input(&mut self, c: char) -> bool {
        if self.input.chars().count() >= MAX_TEXT_LEN {
            return false;
        }
        self.input.push(c);
        true
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    /// Loads a task's text into the input field for editing.
    pub fn begin_edit(&mut self, id: TaskId) {
        let Some(task) = self.tasks.iter().find(|t| t.id == id) else {
            return;
        };
        let text = task.text.clone();
        self.set_input(&text);
        self.editing = Some(id);
        self.focus = Focus::Input;
    }

    pub fn cancel_edit(&mut self) {
        if self.editing.take().is_some() {
            self.input.clear();
        }
    }

    /// The "Enter" action of the input field: saves an edit or adds a task.
    pub fn submit_input(&mut self) -> bool {
        let text = self.input.clone();
        match self.editing {
            Some(id) if self.tasks.iter().any(|t| t.id == id) => {
                let updated = self.update_task(id, &text);
                if updated {
                    self.editing = None;
                    self.input.clear();
                    self.notifier.show("Task updated", NotificationKind::Success);
                }
                updated
            }
            Some(_) => {
                self.cancel_edit();
                false
            }
            None => self.add_task(&text),
        }
    }

    // Persist before render so a drawing problem never hides an unsaved change.
    fn commit(&mut self) {
        self.storage.save(&self.tasks);
        self.render();
    }

    fn render(&mut self) {
        self.renderer.render_all(&self.tasks, ROW_HANDLERS);
        let stats = self.stats();
        self.renderer.update_stats(stats.total, stats.completed);
    }
}
