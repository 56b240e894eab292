//! Persistence gateway for tasktide
//!
//! Durable state is a flat key/value space of strings:
//!
//! ```text
//! currentUser         # plain string, absent when logged out
//! users               # JSON array of every identifier that ever logged in
//! tasks_{username}    # JSON array of Task records, in display order
//! ```
//!
//! [`FileStore`] keeps one file per key inside the data directory and
//! [`MemoryStore`] keeps everything in memory for tests. [`Gateway`] maps
//! between those strings and typed values and holds no state of its own.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Task;

pub const CURRENT_USER_KEY: &str = "currentUser";
pub const USERS_KEY: &str = "users";

/// Key holding the task collection of `user`.
pub fn tasks_key(user: &str) -> String {
    format!("tasks_{}", user)
}

/// String key/value storage with whole-value writes.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as a file in a directory.
///
/// Values are written to a temp file in the same directory and renamed into
/// place, so readers see either the old or the new value in full.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(escape_key(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::storage(key, e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| Error::storage(key, e))?;
        tmp.write_all(value.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| Error::storage(key, e))?;
        tmp.persist(self.path_for(key))
            .map_err(|e| Error::storage(key, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(key, e)),
        }
    }
}

/// Escapes a key into a file name: `[A-Za-z0-9_-]` pass through, every other
/// byte becomes `%XX`.
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set`/`remove` fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::storage(
                key,
                io::Error::new(io::ErrorKind::Other, "writes disabled"),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Typed access to the durable key space.
#[derive(Debug, Clone)]
pub struct Gateway<S> {
    store: S,
}

impl<S: KeyValueStore> Gateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the collection of `user`.
    ///
    /// A missing key is an empty collection. Unreadable or non-array data is
    /// also treated as empty, and individual records that fail to parse are
    /// dropped, so a damaged file never blocks the user.
    pub fn load_tasks(&self, user: &str) -> Vec<Task> {
        let key = tasks_key(user);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(%key, error = %e, "unreadable task collection, starting empty");
                return Vec::new();
            }
        };
        parse_collection(&key, &raw)
    }

    /// Whether `user` has a readable collection. An unreadable one counts as
    /// absent so the caller replaces it with an empty collection.
    pub fn has_tasks(&self, user: &str) -> bool {
        let key = tasks_key(user);
        match self.store.get(&key) {
            Ok(raw) => raw.is_some(),
            Err(e) => {
                warn!(%key, error = %e, "unreadable task collection, resetting to empty");
                false
            }
        }
    }

    /// Writes the whole collection of `user` in one write.
    pub fn save_tasks(&self, user: &str, tasks: &[Task]) -> Result<()> {
        let key = tasks_key(user);
        let s = serde_json::to_string_pretty(tasks)?;
        self.store.set(&key, &s)?;
        debug!(%key, count = tasks.len(), "saved task collection");
        Ok(())
    }

    pub fn current_user(&self) -> Option<String> {
        match self.store.get(CURRENT_USER_KEY) {
            Ok(user) => user
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read current user");
                None
            }
        }
    }

    pub fn set_current_user(&self, user: &str) -> Result<()> {
        self.store.set(CURRENT_USER_KEY, user)
    }

    pub fn clear_current_user(&self) -> Result<()> {
        self.store.remove(CURRENT_USER_KEY)
    }

    /// Every identifier that has logged in, in first-login order.
    pub fn known_users(&self) -> Vec<String> {
        match self.store.get(USERS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "corrupt users list, ignoring");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read users list");
                Vec::new()
            }
        }
    }

    /// Adds `user` to the known users list if it is not there yet.
    pub fn remember_user(&self, user: &str) -> Result<()> {
        let mut users = self.known_users();
        if users.iter().any(|u| u == user) {
            return Ok(());
        }
        users.push(user.to_string());
        let s = serde_json::to_string(&users)?;
        self.store.set(USERS_KEY, &s)
    }
}

fn parse_collection(key: &str, raw: &str) -> Vec<Task> {
    let records = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            warn!(%key, "task collection is not an array, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(%key, error = %e, "corrupt task collection, starting empty");
            return Vec::new();
        }
    };
    let mut tasks = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Task>(record) {
            Ok(task) if task.title.trim().is_empty() => {
                warn!(%key, index, "dropping task record with empty title");
            }
            Ok(task) if tasks.iter().any(|t: &Task| t.id == task.id) => {
                warn!(%key, index, id = %task.id, "dropping task record with duplicate id");
            }
            Ok(task) => tasks.push(task),
            Err(e) => warn!(%key, index, error = %e, "dropping malformed task record"),
        }
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_key_keeps_safe_names() {
        assert_eq!(escape_key("tasks_ann-1"), "tasks_ann-1");
        assert_eq!(escape_key("tasks_a b/c"), "tasks_a%20b%2Fc");
        assert_eq!(escape_key("currentUser"), "currentUser");
    }

    #[test]
    fn escaped_keys_do_not_collide() {
        assert_ne!(escape_key("tasks_a.b"), escape_key("tasks_a%2Eb"));
    }

    #[test]
    fn parse_collection_drops_bad_records_only() {
        let raw = r#"[
            {"id":"t_1","title":"Good","dueDate":"2024-01-01","priority":"","recurrence":"","completed":false},
            {"id":"t_2","title":"Bad date","dueDate":"2024-13-40","priority":"","recurrence":"","completed":false},
            {"id":"t_3","title":"   ","dueDate":"","priority":"","recurrence":"","completed":false},
            {"id":"t_1","title":"Duplicate","dueDate":"","priority":"","recurrence":"","completed":false}
        ]"#;
        let tasks = parse_collection("tasks_x", raw);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Good");
    }

    #[test]
    fn parse_collection_treats_garbage_as_empty() {
        assert!(parse_collection("tasks_x", "{not json").is_empty());
        assert!(parse_collection("tasks_x", r#"{"id":"t_1"}"#).is_empty());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
        b.set_fail_writes(true);
        assert!(a.set("k", "w").is_err());
        assert_eq!(a.get("k").unwrap().as_deref(), Some("v"));
    }
}
