#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDate;
use tasktide::session::Session;
use tasktide::storage::{Gateway, MemoryStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Settable "today" shared between a test and its sessions.
#[derive(Clone)]
pub struct TestClock(Rc<Cell<NaiveDate>>);

impl TestClock {
    pub fn new(today: NaiveDate) -> Self {
        TestClock(Rc::new(Cell::new(today)))
    }

    pub fn set(&self, today: NaiveDate) {
        self.0.set(today);
    }

    pub fn today(&self) -> NaiveDate {
        self.0.get()
    }
}

/// A logged-out session over `store` whose today is driven by `clock`.
pub fn session_on(store: &MemoryStore, clock: &TestClock) -> Session<MemoryStore> {
    let clock = clock.clone();
    Session::new(Gateway::new(store.clone()), Duration::from_secs(60))
        .with_clock(move || clock.today())
}
