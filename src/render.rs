//! Projection from task state to display rows.
//!
//! Every render pass throws the previous rows away and builds fresh
//! [`TaskRow`] descriptors keyed by task id. Rows never point back into the
//! collection; user interaction on a row comes out as a [`Command`] carrying
//! the id, which the controller resolves against its own state.

use crate::controller::Command;
use crate::task::{Task, TaskId};
use std::collections::HashMap;

pub const EMPTY_PLACEHOLDER: &str = "No tasks yet. Add one above!";

/// Interaction on a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEvent {
    ToggleChanged,
    DeleteClicked,
}

/// Callbacks bound to a row by [`Renderer::attach_handlers`].
#[derive(Debug, Clone, Copy)]
pub struct RowHandlers {
    pub on_toggle: fn(TaskId) -> Command,
    pub on_delete: fn(TaskId) -> Command,
}

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: TaskId,
    pub checked: bool,
    pub label: String,
    handlers: Option<RowHandlers>,
}

impl TaskRow {
    /// Returns the command bound to `event`, or `None` if no handlers are attached.
    pub fn dispatch(&self, event: RowEvent) -> Option<Command> {
        let handlers = self.handlers?;
        Some(match event {
            RowEvent::ToggleChanged => (handlers.on_toggle)(self.id),
            RowEvent::DeleteClicked => (handlers.on_delete)(self.id),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsView {
    pub total: String,
    pub completed: String,
}

#[derive(Debug, Clone, Default)]
pub struct View {
    pub rows: Vec<TaskRow>,
    pub placeholder: Option<&'static str>,
    pub stats: StatsView,
    by_id: HashMap<TaskId, usize>,
}

impl View {
    pub fn row(&self, id: TaskId) -> Option<&TaskRow> {
        self.by_id.get(&id).map(|&index| &self.rows[index])
    }

    pub fn row_at(&self, index: usize) -> Option<&TaskRow> {
        self.rows.get(index)
    }
}

/// Owns the current display, never the tasks behind it.
#[derive(Debug, Default)]
pub struct Renderer {
    view: View,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn render_all(&mut self, tasks: &[Task], handlers: RowHandlers) {
        let stats = std::mem::take(&mut self.view.stats);
        self.view = View {
            stats,
            ..View::default()
        };

        if tasks.is_empty() {
            self.view.placeholder = Some(EMPTY_PLACEHOLDER);
            return;
        }

        for task in tasks {
            let mut row = TaskRow {
                id: task.id,
                checked: task.completed,
                label: escape_label(&task.text),
                handlers: None,
            };
            Self::attach_handlers(&mut row, handlers);
            // First occurrence wins, like a linear lookup would.
            self.view.by_id.entry(row.id).or_insert(self.view.rows.len());
            self.view.rows.push(row);
        }
    }

    pub fn attach_handlers(row: &mut TaskRow, handlers: RowHandlers) {
        row.handlers = Some(handlers);
    }

    pub fn update_stats(&mut self, total: usize, completed: usize) {
        self.view.stats = StatsView {
            total: format!("Total: {total}"),
            completed: format!("Completed: {completed}"),
        };
    }
}

/// Makes task text inert for the terminal: control characters (escape
/// sequences, carriage returns, bells) are shown escaped, not executed.
pub fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    escaped
}
