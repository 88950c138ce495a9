//! Application handle: owns the controller plus the UI-only state
//! (selection, quit flag) and turns key presses into controller calls.

use crate::config::Config;
use crate::controller::{Command, Focus, TaskController};
use crate::error::Result;
use crate::notifier::{NotificationKind, Notifier};
use crate::render::RowEvent;
use crate::storage::{FileStore, KeyValueStore};
use crate::task::TaskId;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{info, warn};
use std::time::Instant;

pub struct App<S: KeyValueStore = FileStore> {
    controller: TaskController<S>,
    selected: Option<usize>,
    should_quit: bool,
}

impl App<FileStore> {
    /// Startup sequence: load tasks from the data directory, render, and
    /// hand back the handle the caller keeps for the rest of the session.
    pub fn start(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = FileStore::new(&config.data_dir);
        let notifier = Notifier::new(config.notification_duration());
        let app = Self::with_controller(TaskController::start(store, notifier));
        info!(
            "event=app_ready module=app status=ok data_dir={}",
            config.data_dir.display()
        );
        Ok(app)
    }
}

impl<S: KeyValueStore> App<S> {
    pub fn with_controller(mut controller: TaskController<S>) -> Self {
        if !controller.storage_mut().is_available() {
            warn!("event=app_start module=app status=degraded reason=storage_unavailable");
            controller.notifier_mut().show(
                "Storage unavailable: changes will not be saved",
                NotificationKind::Warning,
            );
        }
        let mut app = Self {
            controller,
            selected: None,
            should_quit: false,
        };
        app.clamp_selection();
        app
    }

    pub fn controller(&self) -> &TaskController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TaskController<S> {
        &mut self.controller
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Timer work: expire the notification.
    pub fn tick(&mut self, now: Instant) {
        self.controller.notifier_mut().prune(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.controller.focus() {
            Focus::Input => self.handle_input_key(key),
            Focus::List => self.handle_list_key(key),
        }
        self.clamp_selection();
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let was_adding = self.controller.editing().is_none();
                if self.controller.submit_input() && was_adding {
                    // Follow the new task, it is always appended.
                    self.selected = self.controller.view().rows.len().checked_sub(1);
                }
            }
            KeyCode::Esc => {
                if self.controller.editing().is_some() {
                    self.controller.cancel_edit();
                    self.controller.set_focus(Focus::List);
                } else {
                    self.controller.set_input("");
                }
            }
            KeyCode::Tab | KeyCode::Down => self.controller.set_focus(Focus::List),
            KeyCode::Backspace => self.controller.pop_input(),
            KeyCode::Char(c) => {
                self.controller.push_input(c);
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Char('a') => self.controller.set_focus(Focus::Input),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Char(' ') => self.dispatch_row_event(RowEvent::ToggleChanged),
            KeyCode::Char('d') | KeyCode::Delete => self.dispatch_row_event(RowEvent::DeleteClicked),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    self.controller.begin_edit(id);
                }
            }
            KeyCode::Char('c') => self.controller.dispatch(Command::ClearCompleted),
            KeyCode::Char('X') => self.controller.dispatch(Command::ClearAll),
            _ => {}
        }
    }

    fn dispatch_row_event(&mut self, event: RowEvent) {
        let command = self
            .selected
            .and_then(|index| self.controller.view().row_at(index))
            .and_then(|row| row.dispatch(event));
        if let Some(command) = command {
            self.controller.dispatch(command);
        }
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.selected
            .and_then(|index| self.controller.view().row_at(index))
            .map(|row| row.id)
    }

    fn move_selection(&mut self, direction: isize) {
        let len = self.controller.view().rows.len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let current = self.selected.unwrap_or(0) as isize;
        self.selected = Some((current + direction).clamp(0, len as isize - 1) as usize);
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.view().rows.len();
        self.selected = match (len, self.selected) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(index)) => Some(index.min(len - 1)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crossterm::event::KeyEventKind;

    fn app() -> App<MemoryStore> {
        App::with_controller(TaskController::start(MemoryStore::new(), Notifier::default()))
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_and_enter_adds_a_task() {
        let mut app = app();
        type_text(&mut app, "Buy milk");
        press(&mut app, KeyCode::Enter);

        let tasks = app.controller().tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Buy milk");
        assert_eq!(app.selected(), Some(0));
    }

    #[test]
    fn list_keys_toggle_and_delete_selected_row() {
        let mut app = app();
        type_text(&mut app, "one");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "two");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.controller().tasks()[0].completed);

        press(&mut app, KeyCode::Char('d'));
        let texts: Vec<&str> = app
            .controller()
            .tasks()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["two"]);
        assert_eq!(app.selected(), Some(0));
    }

    #[test]
    fn edit_round_trip_from_list() {
        let mut app = app();
        type_text(&mut app, "typo");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.controller().focus(), Focus::Input);

        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "pe");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.controller().tasks()[0].text, "type");
        assert_eq!(app.controller().tasks().len(), 1);
    }

    #[test]
    fn letters_in_input_are_text_not_commands() {
        let mut app = app();
        type_text(&mut app, "qdXc");
        assert!(!app.should_quit());
        assert_eq!(app.controller().input(), "qdXc");
    }

    #[test]
    fn ctrl_c_quits_from_any_focus() {
        let mut app = app();
        app.handle_key(KeyEvent::new_with_kind(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
            KeyEventKind::Press,
        ));
        assert!(app.should_quit());
    }

    #[test]
    fn unavailable_storage_warns_on_start() {
        let app = App::with_controller(TaskController::start(
            MemoryStore::unavailable(),
            Notifier::default(),
        ));
        let current = app.controller().notifier().current().unwrap();
        assert_eq!(current.kind, NotificationKind::Warning);
    }

    #[test]
    fn tick_expires_notifications() {
        let mut app = app();
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Enter);
        assert!(app.controller().notifier().current().is_some());

        app.tick(Instant::now() + std::time::Duration::from_secs(10));
        assert!(app.controller().notifier().current().is_none());
    }
}
