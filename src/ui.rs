use crate::app::App;
use crate::controller::Focus;
use crate::storage::KeyValueStore;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const TICK_RATE: Duration = Duration::from_millis(250);

pub fn run_app<B: Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        app.tick(Instant::now());
        terminal.draw(|f| draw(f, app))?;
        if app.should_quit() {
            return Ok(());
        }

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }
}

pub fn draw<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // input
            Constraint::Min(0),    // tasks
            Constraint::Length(1), // stats
            Constraint::Length(1), // notification
            Constraint::Length(1), // help
        ])
        .split(f.area());

    render_input(f, chunks[0], app);
    render_tasks(f, chunks[1], app);
    render_stats(f, chunks[2], app);
    render_notification(f, chunks[3], app);
    render_footer(f, chunks[4], app);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn render_input<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let controller = app.controller();
    let focused = controller.focus() == Focus::Input;
    let title = if controller.editing().is_some() {
        "Edit task"
    } else {
        "New task"
    };

    let input = Paragraph::new(controller.input()).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(focus_style(focused)),
    );
    f.render_widget(input, area);

    if focused {
        let offset = controller.input().chars().count() as u16;
        let x = (area.x + 1 + offset).min(area.right().saturating_sub(2));
        f.set_cursor_position((x, area.y + 1));
    }
}

fn render_tasks<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let view = app.controller().view();
    let focused = app.controller().focus() == Focus::List;

    let items: Vec<ListItem> = match view.placeholder {
        Some(placeholder) => vec![ListItem::new(Span::styled(
            placeholder,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))],
        None => view
            .rows
            .iter()
            .map(|row| {
                let (checkbox, text_style) = if row.checked {
                    (
                        "[x] ",
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    ("[ ] ", Style::default().fg(Color::White))
                };
                ListItem::new(Line::from(vec![
                    Span::raw(checkbox),
                    Span::styled(row.label.as_str(), text_style),
                ]))
            })
            .collect(),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title("Tasks")
                .borders(Borders::ALL)
                .border_style(focus_style(focused)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    let mut state = ListState::default().with_selected(if focused && view.placeholder.is_none() {
        app.selected()
    } else {
        None
    });
    f.render_stateful_widget(list, area, &mut state);
}

fn render_stats<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let stats = &app.controller().view().stats;
    let rate = app.controller().stats().completion_rate;
    let line = Line::from(vec![
        Span::styled(stats.total.as_str(), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(stats.completed.as_str(), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("{rate:.0}% done"), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_notification<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    if let Some(notification) = app.controller().notifier().current() {
        let line = Span::styled(
            notification.message.as_str(),
            Style::default()
                .fg(notification.kind.accent())
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(Paragraph::new(line), area);
    }
}

fn render_footer<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let line = match app.controller().focus() {
        Focus::Input => Line::from(vec![
            key("[Enter]"),
            Span::raw("save "),
            key("[Esc]"),
            Span::raw("cancel "),
            key("[Tab]"),
            Span::raw("list "),
            key("[Ctrl-C]"),
            Span::raw("quit"),
        ]),
        Focus::List => Line::from(vec![
            key("[↑/↓]"),
            Span::raw("select "),
            key("[Space]"),
            Span::raw("toggle "),
            key("[e]"),
            Span::raw("dit "),
            key("[d]"),
            Span::raw("elete "),
            key("[c]"),
            Span::raw("lear done "),
            key("[X]"),
            Span::raw("clear all "),
            key("[Tab]"),
            Span::raw("input "),
            key("[q]"),
            Span::raw("uit"),
        ]),
    };
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::TaskController;
    use crate::notifier::Notifier;
    use crate::storage::MemoryStore;
    use ratatui::backend::TestBackend;

    fn screen(app: &App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn empty_list_draws_placeholder_and_zero_stats() {
        let app = App::with_controller(TaskController::start(
            MemoryStore::new(),
            Notifier::default(),
        ));
        let text = screen(&app);
        assert!(text.contains("No tasks yet. Add one above!"));
        assert!(text.contains("Total: 0"));
        assert!(text.contains("Completed: 0"));
    }

    #[test]
    fn rows_draw_checkboxes_and_notification() {
        let mut app = App::with_controller(TaskController::start(
            MemoryStore::new(),
            Notifier::default(),
        ));
        app.controller_mut().add_task("Buy milk");
        app.controller_mut().add_task("Walk dog");
        let id = app.controller().tasks()[0].id;
        app.controller_mut().toggle_task(id);

        let text = screen(&app);
        assert!(text.contains("[x] Buy milk"));
        assert!(text.contains("[ ] Walk dog"));
        assert!(text.contains("Total: 2"));
        assert!(text.contains("Completed: 1"));
        assert!(text.contains("Task added"));
    }
}
