use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};
use tasklist::{logging, ui, App, Config, KeyValueStore, NotificationKind, TaskId};

fn cli() -> Command {
    Command::new("tasklist")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal task list with local JSON persistence")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding tasks, config and logs"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("trace|debug|info|warn|error|off"),
        )
        .subcommand(Command::new("init").about("Write a default config file"))
        .subcommand(
            Command::new("add")
                .about("Add a new task")
                .arg(Arg::new("text").required(true).help("Task text")),
        )
        .subcommand(Command::new("list").about("List all tasks"))
        .subcommand(Command::new("stats").about("Show statistics"))
        .subcommand(
            Command::new("toggle")
                .about("Flip a task between done and not done")
                .arg(id_arg()),
        )
        .subcommand(Command::new("delete").about("Delete a task").arg(id_arg()))
        .subcommand(
            Command::new("edit")
                .about("Replace a task's text")
                .arg(id_arg())
                .arg(Arg::new("text").required(true).help("New text")),
        )
        .subcommand(
            Command::new("clear").about("Delete all tasks").arg(
                Arg::new("completed")
                    .long("completed")
                    .action(ArgAction::SetTrue)
                    .help("Only delete completed tasks"),
            ),
        )
        .subcommand(
            Command::new("export")
                .about("Print or write all tasks")
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .action(ArgAction::SetTrue)
                        .help("CSV instead of JSON"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to this file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Replace all tasks with the contents of a JSON export")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(TaskId))
        .help("Task id")
}

fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    let config = Config::resolve(
        matches.get_one::<PathBuf>("data-dir").cloned(),
        matches.get_one::<String>("log-level").cloned(),
    )?;

    if let Some(("init", _)) = matches.subcommand() {
        if Config::init(&config.data_dir)? {
            println!("Initialized tasklist in {}", config.data_dir.display());
        } else {
            println!("tasklist already initialized in {}", config.data_dir.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(err) = logging::init_logging(&config.log_level, &config.log_dir()) {
        eprintln!("warning: {err}");
    }

    let mut app = App::start(&config)?;
    let result = match matches.subcommand() {
        Some((name, sub_matches)) => run_command(&mut app, name, sub_matches),
        None => run_tui(&mut app).map(|()| ExitCode::SUCCESS),
    };
    log::logger().flush();
    result
}

fn run_command(app: &mut App, name: &str, sub_matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let id = || sub_matches.get_one::<TaskId>("id").copied().unwrap_or_default();
    let text = || {
        sub_matches
            .get_one::<String>("text")
            .cloned()
            .unwrap_or_default()
    };

    let accepted = match name {
        "add" => app.controller_mut().add_task(&text()),
        "edit" => edit_task(app, id(), &text(), &mut io::stderr()),
        "toggle" => {
            app.controller_mut().toggle_task(id());
            true
        }
        "delete" => {
            app.controller_mut().delete_task(id());
            true
        }
        "clear" => {
            if sub_matches.get_flag("completed") {
                app.controller_mut().clear_completed();
            } else {
                app.controller_mut().clear_all();
            }
            true
        }
        "list" => {
            print_list(app);
            true
        }
        "stats" => {
            let stats = app.controller().stats();
            println!("Total: {}", stats.total);
            println!("Completed: {}", stats.completed);
            println!("Incomplete: {}", stats.incomplete);
            println!("Completion: {:.1}%", stats.completion_rate);
            true
        }
        "export" => {
            let data = if sub_matches.get_flag("csv") {
                app.controller().export_csv()?
            } else {
                app.controller().export_tasks()?
            };
            match sub_matches.get_one::<PathBuf>("output") {
                Some(path) => fs::write(path, data)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{data}"),
            }
            true
        }
        "import" => {
            let path = sub_matches
                .get_one::<PathBuf>("file")
                .context("missing import file")?;
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            app.controller_mut().import_tasks(&data)
        }
        other => anyhow::bail!("unknown command `{other}`"),
    };

    report(app);
    Ok(if accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

// update_task is silent on a missing id, which leaves a headless edit
// with no output at all.
fn edit_task<S: KeyValueStore>(
    app: &mut App<S>,
    id: TaskId,
    text: &str,
    err: &mut impl Write,
) -> bool {
    if !app.controller().contains(id) {
        let _ = writeln!(err, "no task with id {id}");
        return false;
    }
    app.controller_mut().update_task(id, text)
}

fn print_list(app: &App) {
    let view = app.controller().view();
    if let Some(placeholder) = view.placeholder {
        println!("{placeholder}");
        return;
    }
    for row in &view.rows {
        let mark = if row.checked { "x" } else { " " };
        println!("[{mark}] #{} {}", row.id, row.label);
    }
}

fn report(app: &App) {
    if let Some(notification) = app.controller().notifier().current() {
        match notification.kind {
            NotificationKind::Error | NotificationKind::Warning => {
                eprintln!("{}", notification.message)
            }
            NotificationKind::Success | NotificationKind::Info => {
                println!("{}", notification.message)
            }
        }
    }
}

fn run_tui(app: &mut App) -> anyhow::Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.context("terminal UI failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklist::{MemoryStore, Notifier, TaskController};

    fn app() -> App<MemoryStore> {
        App::with_controller(TaskController::start(MemoryStore::new(), Notifier::default()))
    }

    #[test]
    fn edit_of_missing_id_names_the_id() {
        let mut app = app();
        let mut err = Vec::new();

        assert!(!edit_task(&mut app, 42, "renamed", &mut err));
        assert_eq!(String::from_utf8(err).unwrap(), "no task with id 42\n");
    }

    #[test]
    fn edit_of_existing_id_writes_nothing_to_stderr() {
        let mut app = app();
        app.controller_mut().add_task("before");
        let id = app.controller().tasks()[0].id;
        let mut err = Vec::new();

        assert!(edit_task(&mut app, id, "after", &mut err));
        assert!(err.is_empty());
        assert_eq!(app.controller().tasks()[0].text, "after");
    }
}
