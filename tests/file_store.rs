use std::fs;
use tasklist::{
    App, Config, FileStore, KeyValueStore, Notifier, Task, TaskController, TaskStorage, TASKS_KEY,
};

#[test]
fn file_store_get_set_remove() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path().join("nested"));

    assert_eq!(store.get(TASKS_KEY).unwrap(), None);
    store.set(TASKS_KEY, "[]").unwrap();
    assert_eq!(store.get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
    assert!(dir.path().join("nested").join("tasks.json").exists());

    store.remove(TASKS_KEY).unwrap();
    store.remove(TASKS_KEY).unwrap();
    assert_eq!(store.get(TASKS_KEY).unwrap(), None);
}

#[test]
fn tasks_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = TaskController::start(FileStore::new(dir.path()), Notifier::default());
    first.add_task("written");
    first.add_task("and toggled");
    let id = first.tasks()[1].id;
    first.toggle_task(id);
    let saved = first.tasks().to_vec();
    drop(first);

    let second = TaskController::start(FileStore::new(dir.path()), Notifier::default());
    assert_eq!(second.tasks(), saved.as_slice());
}

#[test]
fn corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tasks.json"), "[{\"id\": 1, \"text\": ").unwrap();

    let controller = TaskController::start(FileStore::new(dir.path()), Notifier::default());
    assert!(controller.tasks().is_empty());
}

#[test]
fn clear_deletes_the_file_and_store_reports_available() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = TaskStorage::new(FileStore::new(dir.path()));
    storage.save(&[Task::create("x")]);
    assert!(dir.path().join("tasks.json").exists());

    storage.clear();
    assert!(!dir.path().join("tasks.json").exists());
    assert!(storage.is_available());
}

#[test]
fn app_start_uses_config_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(dir.path()).unwrap();

    let mut app = App::start(&config).unwrap();
    app.controller_mut().add_task("from app");
    assert!(app.controller().notifier().current().is_some());

    let reopened = App::start(&config).unwrap();
    assert_eq!(reopened.controller().tasks()[0].text, "from app");
}
