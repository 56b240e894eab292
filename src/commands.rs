use std::thread;
use std::time::{Duration, Instant};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::error::{Error, Result};
use crate::models::{parse_due_date, NewTask, Priority, Recurrence, Task, TaskId, TaskPatch};
use crate::overview::View;
use crate::session::Session;
use crate::storage::KeyValueStore;

/// Logs in and reports how many tasks the user has.
pub fn cmd_login<S: KeyValueStore + Clone>(session: &mut Session<S>, user: &str) -> Result<()> {
    session.login(user)?;
    let count = session.tasks()?.len();
    println!(
        "Logged in as {} ({} task{}).",
        session.current_user().unwrap_or_default(),
        count,
        if count == 1 { "" } else { "s" }
    );
    Ok(())
}

pub fn cmd_logout<S: KeyValueStore + Clone>(session: &mut Session<S>) -> Result<()> {
    match session.current_user().map(str::to_string) {
        Some(user) => {
            session.logout()?;
            println!("Logged out {}.", user);
        }
        None => println!("Nobody is logged in."),
    }
    Ok(())
}

pub fn cmd_whoami<S: KeyValueStore + Clone>(session: &Session<S>) -> Result<()> {
    match session.current_user() {
        Some(user) => println!("{}", user),
        None => return Err(Error::NoActiveUser),
    }
    Ok(())
}

/// Lists every user that has logged in, marking the active one.
pub fn cmd_users<S: KeyValueStore + Clone>(session: &Session<S>) -> Result<()> {
    let users = session.known_users();
    if users.is_empty() {
        println!("No users yet.");
        return Ok(());
    }
    for user in users {
        let marker = if session.current_user() == Some(user.as_str()) { "*" } else { " " };
        println!("{} {}", marker, user);
    }
    Ok(())
}

/// Adds a new task for the active user.
pub fn cmd_add<S: KeyValueStore + Clone>(
    session: &mut Session<S>,
    title: &str,
    due: Option<&str>,
    priority: Option<&str>,
    recur: Option<&str>,
) -> Result<Task> {
    let new = NewTask {
        title: title.to_string(),
        due_date: match due {
            Some(raw) => parse_due_date(raw)?,
            None => None,
        },
        priority: priority.map(str::parse::<Priority>).transpose()?.unwrap_or_default(),
        recurrence: recur.map(str::parse::<Recurrence>).transpose()?.unwrap_or_default(),
    };
    let task = session.create_task(new)?;
    println!("Task added (id = {})", task.id);
    Ok(task)
}

/// Edits the given fields of a task. `clear_due` removes the due date.
pub fn cmd_edit<S: KeyValueStore + Clone>(
    session: &mut Session<S>,
    id: &str,
    title: Option<&str>,
    due: Option<&str>,
    clear_due: bool,
    priority: Option<&str>,
    recur: Option<&str>,
) -> Result<Task> {
    let id = resolve_id(session.tasks()?, id)?;
    let patch = TaskPatch {
        title: title.map(str::to_string),
        due_date: if clear_due {
            Some(None)
        } else {
            due.map(parse_due_date).transpose()?
        },
        priority: priority.map(str::parse::<Priority>).transpose()?,
        recurrence: recur.map(str::parse::<Recurrence>).transpose()?,
    };
    if patch.is_empty() {
        return Err(Error::validation("nothing to change"));
    }
    let task = session.update_task(&id, &patch)?;
    println!("Task {} updated.", task.id);
    Ok(task)
}

pub fn cmd_toggle<S: KeyValueStore + Clone>(session: &mut Session<S>, id: &str) -> Result<Task> {
    let id = resolve_id(session.tasks()?, id)?;
    let task = session.toggle_completed(&id)?;
    println!(
        "Task {} marked as {}.",
        task.id,
        if task.completed { "complete" } else { "pending" }
    );
    Ok(task)
}

pub fn cmd_set_done<S: KeyValueStore + Clone>(
    session: &mut Session<S>,
    id: &str,
    done: bool,
) -> Result<Task> {
    let id = resolve_id(session.tasks()?, id)?;
    let task = session.set_completed(&id, done)?;
    println!(
        "Task {} marked as {}.",
        task.id,
        if done { "complete" } else { "pending" }
    );
    Ok(task)
}

pub fn cmd_remove<S: KeyValueStore + Clone>(session: &mut Session<S>, id: &str) -> Result<Task> {
    let id = resolve_id(session.tasks()?, id)?;
    let task = session.delete_task(&id)?;
    println!("Task {} removed.", task.id);
    Ok(task)
}

/// Prints the categorized task list, as a table or as JSON.
pub fn cmd_list<S: KeyValueStore + Clone>(session: &Session<S>, json: bool) -> Result<()> {
    let view = session.view()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", render_view(&view));
    }
    Ok(())
}

/// Runs one recurrence evaluation now.
pub fn cmd_tick<S: KeyValueStore + Clone>(session: &mut Session<S>) -> Result<Vec<Task>> {
    let spawned = session.run_recurrence()?;
    report_spawned(&spawned);
    Ok(spawned)
}

/// Keeps evaluating recurrence on the session schedule until `max_ticks`
/// evaluations have run (forever if `None`).
pub fn cmd_watch<S: KeyValueStore + Clone>(
    session: &mut Session<S>,
    max_ticks: Option<u64>,
) -> Result<()> {
    if !session.is_logged_in() {
        return Err(Error::NoActiveUser);
    }
    println!(
        "Watching recurring tasks every {}s (Ctrl-C to stop).",
        session.schedule().interval().as_secs()
    );
    let mut ticks = 0;
    while max_ticks.map_or(true, |max| ticks < max) {
        let wait = session
            .schedule()
            .remaining(Instant::now())
            .unwrap_or(Duration::ZERO);
        thread::sleep(wait);
        if !session.schedule().is_running() {
            break;
        }
        match session.poll_tick(Instant::now()) {
            Ok(spawned) => report_spawned(&spawned),
            Err(e) => eprintln!("Recurrence pass failed: {}", e),
        }
        ticks += 1;
    }
    Ok(())
}

fn report_spawned(spawned: &[Task]) {
    for t in spawned {
        println!(
            "Recurring task '{}' created due on {} (id = {})",
            t.title,
            t.due_date.map(|d| d.to_string()).unwrap_or_default(),
            t.id
        );
    }
}

/// Resolves a full id or a unique prefix of one (with or without `t_`).
pub fn resolve_id(tasks: &[Task], input: &str) -> Result<TaskId> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("task id cannot be empty"));
    }
    if let Some(t) = tasks.iter().find(|t| t.id.as_str() == trimmed) {
        return Ok(t.id.clone());
    }

    let needle = trimmed.trim_start_matches("t_").to_lowercase();
    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id.as_str().trim_start_matches("t_").starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [] => Err(Error::NotFound(TaskId::from(trimmed))),
        [only] => Ok(only.id.clone()),
        many => Err(Error::validation(format!(
            "ambiguous task id '{}': {}",
            trimmed,
            many.iter().map(|t| t.id.as_str()).collect::<Vec<_>>().join(", ")
        ))),
    }
}

/// Renders a view as a table followed by a progress line.
pub fn render_view(view: &View) -> String {
    if view.total() == 0 {
        return "No tasks found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Repeats").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let sections = [
        (&view.overdue, "Overdue", Color::Red),
        (&view.pending, "Pending", Color::Yellow),
        (&view.completed, "Done", Color::Green),
    ];
    for (tasks, status, color) in sections {
        for t in tasks {
            let due = match t.due_date {
                Some(d) if d == view.today => "Today".to_string(),
                Some(d) => d.to_string(),
                None => "-".to_string(),
            };
            let priority_color = match t.priority {
                Priority::High => Color::Red,
                Priority::Medium => Color::Yellow,
                Priority::Low => Color::Blue,
                Priority::None => Color::Reset,
            };
            table.add_row(vec![
                Cell::new(&t.id),
                Cell::new(&t.title),
                Cell::new(due).fg(if status == "Overdue" { Color::Red } else { Color::Reset }),
                Cell::new(t.priority).fg(priority_color),
                Cell::new(t.recurrence),
                Cell::new(status).fg(color),
            ]);
        }
    }

    format!(
        "{table}\nProgress: {}% ({}/{} done)",
        view.progress_percent,
        view.completed.len(),
        view.total()
    )
}
