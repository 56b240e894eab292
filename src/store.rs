use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{NewTask, Task, TaskId, TaskPatch};
use crate::recurrence;
use crate::storage::{Gateway, KeyValueStore};

/// Owns the active user's task collection.
///
/// Every mutation rewrites the whole collection through the [`Gateway`].
/// If that write fails the error is returned and the in-memory change is
/// kept, so the caller can retry with [`TaskStore::persist`].
#[derive(Debug)]
pub struct TaskStore<S> {
    user: String,
    tasks: Vec<Task>,
    gateway: Gateway<S>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Loads the collection of `user`.
    pub fn open(user: impl Into<String>, gateway: Gateway<S>) -> Self {
        let user = user.into();
        let tasks = gateway.load_tasks(&user);
        Self {
            user,
            tasks,
            gateway,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Snapshot of the collection in display order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    /// Appends a new incomplete task and persists.
    pub fn create(&mut self, new: NewTask) -> Result<Task> {
        let task = self.build(new)?;
        self.tasks.push(task.clone());
        self.persist()?;
        Ok(task)
    }

    /// Applies the provided fields to an existing task and persists.
    pub fn update(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
        let index = self.position(id)?;
        patch.apply(&mut self.tasks[index])?;
        let task = self.tasks[index].clone();
        self.persist()?;
        Ok(task)
    }

    pub fn set_completed(&mut self, id: &TaskId, completed: bool) -> Result<Task> {
        let index = self.position(id)?;
        self.tasks[index].completed = completed;
        let task = self.tasks[index].clone();
        self.persist()?;
        Ok(task)
    }

    pub fn toggle_completed(&mut self, id: &TaskId) -> Result<Task> {
        let index = self.position(id)?;
        let completed = !self.tasks[index].completed;
        self.set_completed(id, completed)
    }

    /// Removes a task. Deleting an id that is not there is an error.
    pub fn delete(&mut self, id: &TaskId) -> Result<Task> {
        let index = self.position(id)?;
        let task = self.tasks.remove(index);
        self.persist()?;
        Ok(task)
    }

    /// Writes the whole collection.
    pub fn persist(&self) -> Result<()> {
        self.gateway.save_tasks(&self.user, &self.tasks)
    }

    /// Runs one recurrence pass for `today` and returns the spawned tasks.
    ///
    /// The pass is all-or-nothing: it is built on a copy of the collection
    /// and only swapped in once the write succeeded.
    pub fn run_recurrence(&mut self, today: NaiveDate) -> Result<Vec<Task>> {
        let spawns = recurrence::evaluate(&self.tasks, today);
        if spawns.is_empty() {
            return Ok(Vec::new());
        }

        let mut next = self.tasks.clone();
        let mut spawned = Vec::with_capacity(spawns.len());
        for spawn in spawns {
            let task = match self.build_avoiding(spawn.occurrence, &next) {
                Ok(task) => task,
                Err(e) => {
                    warn!(origin = %spawn.origin, error = %e, "skipping occurrence");
                    continue;
                }
            };
            if let Some(origin) = next.iter_mut().find(|t| t.id == spawn.origin) {
                origin.spawned_for = Some(today);
            }
            next.push(task.clone());
            spawned.push(task);
        }

        self.gateway.save_tasks(&self.user, &next)?;
        self.tasks = next;
        for task in &spawned {
            info!(user = %self.user, id = %task.id, title = %task.title, due = ?task.due_date, "spawned recurring task");
        }
        Ok(spawned)
    }

    fn build(&self, new: NewTask) -> Result<Task> {
        self.build_avoiding(new, &self.tasks)
    }

    fn build_avoiding(&self, new: NewTask, existing: &[Task]) -> Result<Task> {
        let mut id = TaskId::generate();
        while existing.iter().any(|t| t.id == id) {
            id = TaskId::generate();
        }
        Task::new(id, new)
    }

    fn position(&self, id: &TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| Error::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Recurrence};
    use crate::storage::MemoryStore;

    fn store() -> (MemoryStore, TaskStore<MemoryStore>) {
        let backing = MemoryStore::new();
        let store = TaskStore::open("ann", Gateway::new(backing.clone()));
        (backing, store)
    }

    #[test]
    fn create_appends_in_order() {
        let (_, mut store) = store();
        let a = store.create(NewTask::titled("First")).unwrap();
        let b = store.create(NewTask::titled(" Second ")).unwrap();
        let titles: Vec<_> = store.list().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second"]);
        assert_ne!(a.id, b.id);
        assert!(!b.completed);
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let (backing, mut store) = store();
        store.create(NewTask::titled("Saved")).unwrap();
        backing.set_fail_writes(true);
        let err = store.create(NewTask::titled("Unsaved")).unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
        assert_eq!(store.list().len(), 2);

        backing.set_fail_writes(false);
        store.persist().unwrap();
        let reloaded = TaskStore::open("ann", Gateway::new(backing));
        assert_eq!(reloaded.list().len(), 2);
    }

    #[test]
    fn recurrence_pass_is_all_or_nothing() {
        let (backing, mut store) = store();
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        store
            .create(
                NewTask::titled("Stretch")
                    .due(today)
                    .priority(Priority::Low)
                    .recurrence(Recurrence::Daily),
            )
            .unwrap();

        backing.set_fail_writes(true);
        assert!(store.run_recurrence(today).is_err());
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].spawned_for, None);

        backing.set_fail_writes(false);
        let spawned = store.run_recurrence(today).unwrap();
        assert_eq!(spawned.len(), 1);
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.list()[0].spawned_for, Some(today));
    }
}
