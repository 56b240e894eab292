//! Recurrence engine.
//!
//! A recurring task whose due date is today spawns a sibling due one
//! interval later. The original is only marked with `spawned_for`, so
//! repeated evaluations on the same day never spawn twice.

use std::time::{Duration, Instant};

use chrono::{Days, Months, NaiveDate};
use tracing::warn;

use crate::models::{NewTask, Recurrence, Task, TaskId};

/// Default period between evaluations.
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

/// Due date one interval after `due`.
///
/// Monthly steps keep the day of month, clamped to the last day of a shorter
/// month (Jan 31 -> Feb 28/29). Returns `None` for `Recurrence::None` or if
/// the date would leave chrono's range.
pub fn next_due(due: NaiveDate, recurrence: Recurrence) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::None => None,
        Recurrence::Daily => due.checked_add_days(Days::new(1)),
        Recurrence::Weekly => due.checked_add_days(Days::new(7)),
        Recurrence::Monthly => due.checked_add_months(Months::new(1)),
    }
}

/// Whether `task` should spawn its next occurrence on `today`.
pub fn is_eligible(task: &Task, today: NaiveDate) -> bool {
    task.recurrence.is_recurring()
        && task.due_date == Some(today)
        && task.spawned_for != Some(today)
}

/// One occurrence the engine wants to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawn {
    /// Task the occurrence is derived from.
    pub origin: TaskId,
    pub occurrence: NewTask,
}

/// Plans the occurrences due on `today`. Pure: nothing is mutated.
///
/// A task whose next date cannot be computed is logged and skipped; the rest
/// of the scan continues.
pub fn evaluate(tasks: &[Task], today: NaiveDate) -> Vec<Spawn> {
    tasks
        .iter()
        .filter(|t| is_eligible(t, today))
        .filter_map(|t| match next_due(today, t.recurrence) {
            Some(next) => Some(Spawn {
                origin: t.id.clone(),
                occurrence: NewTask {
                    title: t.title.clone(),
                    due_date: Some(next),
                    priority: t.priority,
                    recurrence: t.recurrence,
                },
            }),
            None => {
                warn!(id = %t.id, due = %today, "cannot compute next occurrence, skipping");
                None
            }
        })
        .collect()
}

/// Cancelable fixed-interval schedule for engine evaluations.
///
/// The caller owns the loop and asks [`Schedule::poll`] whether a tick is
/// due, which keeps every evaluation on the caller's thread.
#[derive(Debug, Clone)]
pub struct Schedule {
    interval: Duration,
    next_at: Option<Instant>,
}

impl Schedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_at: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// (Re)starts the schedule, first tick one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_at = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_at.is_some()
    }

    /// Returns true if a tick is due at `now` and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_at {
            Some(at) if now >= at => {
                self.next_at = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    /// Time left until the next tick, `None` when stopped.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_at.map(|at| at.saturating_duration_since(now))
    }
}
