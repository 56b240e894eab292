//! Session management and the query/command surface used by front ends.
//!
//! A [`Session`] binds the process to at most one user. Logging in attaches
//! a [`TaskStore`] for that user's collection, runs one recurrence pass and
//! starts the periodic [`Schedule`]; logging out drops the in-memory
//! collection and stops the schedule. Durable data is never deleted.

use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{NewTask, Task, TaskId, TaskPatch};
use crate::overview::View;
use crate::recurrence::Schedule;
use crate::storage::{Gateway, KeyValueStore};
use crate::store::TaskStore;

type Clock = Box<dyn Fn() -> NaiveDate>;

pub struct Session<S> {
    gateway: Gateway<S>,
    active: Option<TaskStore<S>>,
    schedule: Schedule,
    clock: Clock,
}

impl<S: KeyValueStore + Clone> Session<S> {
    /// Creates a logged-out session that reads today's date from the local clock.
    pub fn new(gateway: Gateway<S>, tick: Duration) -> Self {
        Self {
            gateway,
            active: None,
            schedule: Schedule::new(tick),
            clock: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Replaces the source of "today".
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn gateway(&self) -> &Gateway<S> {
        &self.gateway
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn current_user(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.user())
    }

    pub fn is_logged_in(&self) -> bool {
        self.active.is_some()
    }

    pub fn known_users(&self) -> Vec<String> {
        self.gateway.known_users()
    }

    /// Logs in as `user` (trimmed), replacing any active session.
    pub fn login(&mut self, user: &str) -> Result<()> {
        let user = user.trim();
        if user.is_empty() {
            return Err(Error::validation("user name must not be empty"));
        }
        self.attach(user)?;
        if let Err(e) = self.gateway.set_current_user(user) {
            self.active = None;
            self.schedule.stop();
            return Err(e);
        }
        info!(user, "logged in");
        Ok(())
    }

    /// Logs out. Does nothing when nobody is logged in.
    pub fn logout(&mut self) -> Result<()> {
        let Some(store) = self.active.take() else {
            return Ok(());
        };
        self.schedule.stop();
        info!(user = store.user(), "logged out");
        self.gateway.clear_current_user()
    }

    /// Re-attaches the user persisted by an earlier login, if any.
    pub fn restore(&mut self) -> Result<Option<String>> {
        let Some(user) = self.gateway.current_user() else {
            return Ok(None);
        };
        self.attach(&user)?;
        info!(user = %user, "restored session");
        Ok(Some(user))
    }

    fn attach(&mut self, user: &str) -> Result<()> {
        if !self.gateway.has_tasks(user) {
            self.gateway.save_tasks(user, &[])?;
        }
        self.gateway.remember_user(user)?;
        self.active = Some(TaskStore::open(user, self.gateway.clone()));
        self.schedule.start(Instant::now());
        if let Err(e) = self.run_recurrence() {
            warn!(user, error = %e, "recurrence pass on login failed");
        }
        Ok(())
    }

    pub fn store(&self) -> Result<&TaskStore<S>> {
        self.active.as_ref().ok_or(Error::NoActiveUser)
    }

    fn store_mut(&mut self) -> Result<&mut TaskStore<S>> {
        self.active.as_mut().ok_or(Error::NoActiveUser)
    }

    pub fn tasks(&self) -> Result<&[Task]> {
        Ok(self.store()?.list())
    }

    /// Categorized tasks and progress as of `today`.
    pub fn get_view(&self, today: NaiveDate) -> Result<View> {
        Ok(View::build(self.tasks()?, today))
    }

    /// [`Session::get_view`] for the session clock's today.
    pub fn view(&self) -> Result<View> {
        self.get_view(self.today())
    }

    pub fn create_task(&mut self, new: NewTask) -> Result<Task> {
        self.store_mut()?.create(new)
    }

    pub fn update_task(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
        self.store_mut()?.update(id, patch)
    }

    pub fn set_completed(&mut self, id: &TaskId, completed: bool) -> Result<Task> {
        self.store_mut()?.set_completed(id, completed)
    }

    pub fn toggle_completed(&mut self, id: &TaskId) -> Result<Task> {
        self.store_mut()?.toggle_completed(id)
    }

    pub fn delete_task(&mut self, id: &TaskId) -> Result<Task> {
        self.store_mut()?.delete(id)
    }

    /// Runs one recurrence evaluation for today.
    pub fn run_recurrence(&mut self) -> Result<Vec<Task>> {
        let today = self.today();
        self.store_mut()?.run_recurrence(today)
    }

    /// Runs a recurrence evaluation if the schedule says one is due at `now`.
    ///
    /// Returns an empty list when logged out or when no tick is due.
    pub fn poll_tick(&mut self, now: Instant) -> Result<Vec<Task>> {
        if self.active.is_none() || !self.schedule.poll(now) {
            return Ok(Vec::new());
        }
        debug!("recurrence tick");
        self.run_recurrence()
    }
}
