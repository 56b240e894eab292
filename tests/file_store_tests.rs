use std::fs;
use std::time::Duration;

use tasktide::models::{NewTask, Priority, Recurrence};
use tasktide::session::Session;
use tasktide::storage::{tasks_key, FileStore, Gateway, KeyValueStore};

fn session_in(dir: &std::path::Path) -> Session<FileStore> {
    Session::new(Gateway::new(FileStore::new(dir)), Duration::from_secs(60))
}

#[test]
fn file_store_get_set_remove() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path().join("nested"));

    assert_eq!(store.get("currentUser")?, None);
    store.set("currentUser", "ann")?;
    assert_eq!(store.get("currentUser")?.as_deref(), Some("ann"));
    store.set("currentUser", "bob")?;
    assert_eq!(store.get("currentUser")?.as_deref(), Some("bob"));

    store.remove("currentUser")?;
    assert_eq!(store.get("currentUser")?, None);
    store.remove("currentUser")?;
    Ok(())
}

#[test]
fn odd_user_names_map_to_safe_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());
    let key = tasks_key("../ann smith");
    store.set(&key, "[]")?;

    let path = store.path_for(&key);
    assert_eq!(path.parent(), Some(dir.path()));
    assert!(path.exists());
    assert_eq!(store.get(&key)?.as_deref(), Some("[]"));
    Ok(())
}

#[test]
fn session_persists_across_processes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    {
        let mut session = session_in(dir.path());
        session.login("ann")?;
        session.create_task(
            NewTask::titled("File taxes")
                .priority(Priority::High)
                .recurrence(Recurrence::Monthly),
        )?;
    }

    let mut session = session_in(dir.path());
    assert_eq!(session.restore()?.as_deref(), Some("ann"));
    let tasks = session.tasks()?;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "File taxes");
    assert_eq!(tasks[0].priority, Priority::High);
    assert_eq!(tasks[0].recurrence, Recurrence::Monthly);
    Ok(())
}

#[test]
fn on_disk_shape_uses_empty_strings() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut session = session_in(dir.path());
    session.login("ann")?;
    session.create_task(NewTask::titled("Plain"))?;

    let store = FileStore::new(dir.path());
    let raw = fs::read_to_string(store.path_for(&tasks_key("ann")))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let record = &value[0];
    assert_eq!(record["title"], "Plain");
    assert_eq!(record["dueDate"], "");
    assert_eq!(record["priority"], "");
    assert_eq!(record["recurrence"], "");
    assert_eq!(record["completed"], false);
    assert!(record["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(record.get("spawnedFor").is_none());
    Ok(())
}

#[test]
fn legacy_collection_loads() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());
    store.set(
        &tasks_key("ann"),
        r#"[{"id":"t_1a2b","title":"Old","dueDate":"2024-05-01","priority":"Low","recurring":"Weekly","completed":true}]"#,
    )?;

    let mut session = session_in(dir.path());
    session.login("ann")?;
    let tasks = session.tasks()?;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].recurrence, Recurrence::Weekly);
    assert!(tasks[0].completed);
    Ok(())
}

#[test]
fn unreadable_collection_does_not_block_login() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());
    let path = store.path_for(&tasks_key("ann"));
    fs::write(&path, [0xff, 0xfe, b'[', b']'])?;
    store.set("currentUser", "ann")?;

    let mut session = session_in(dir.path());
    assert_eq!(session.restore()?.as_deref(), Some("ann"));
    assert!(session.tasks()?.is_empty());

    fs::write(&path, [0xff, 0xfe])?;
    let mut session = session_in(dir.path());
    session.login("ann")?;
    assert!(session.tasks()?.is_empty());
    session.create_task(NewTask::titled("Fresh start"))?;
    assert_eq!(session_in(dir.path()).gateway().load_tasks("ann").len(), 1);
    Ok(())
}
