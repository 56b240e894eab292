//! # Tasktide
//!
//! A personal task tracker. Each user keeps an ordered list of tasks with an
//! optional due date, a priority and a recurrence rule. The library derives
//! overdue status and completion progress, and spawns the next occurrence of
//! recurring tasks when they come due.
//!
//! The pieces, from the bottom up:
//!
//! *   [`models`]: the `Task` record and its validation.
//! *   [`storage`]: key/value persistence (`currentUser`, `tasks_{user}`).
//! *   [`store`]: create/update/complete/delete over one user's collection.
//! *   [`overview`]: overdue/pending/completed grouping and progress.
//! *   [`recurrence`]: next-occurrence generation and the tick schedule.
//! *   [`session`]: login/logout/restore and the front-end facing API.
//!
//! [`commands`] and [`tui`] are the two front ends shipped with the binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod overview;
pub mod recurrence;
pub mod session;
pub mod storage;
pub mod store;
pub mod tui;

pub use error::{Error, Result};
