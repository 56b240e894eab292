use ratatui::widgets::TableState;

use crate::error::Result;
use crate::models::{
    parse_due_date, validate_title, NewTask, Priority, Recurrence, Task, TaskId, TaskPatch,
};
use crate::overview::View;
use crate::session::Session;
use crate::storage::KeyValueStore;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum InputMode {
    Normal,
    Login,
    Editing,
    Adding,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum InputField {
    None,
    Title,
    Due,
    Priority,
    Recur,
}

/// Section a row belongs to, in display order.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Section {
    Overdue,
    Pending,
    Completed,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Section::Overdue => "Overdue",
            Section::Pending => "Pending",
            Section::Completed => "Done",
        }
    }
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub new: NewTask,
    pub step: usize, // 0: Title, 1: Due, 2: Priority, 3: Recur
}

/// Transient view state. Task data always comes from the session.
pub struct App {
    pub view: Option<View>,
    pub rows: Vec<(Section, Task)>,
    pub state: TableState,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<TaskId>,
    pub add_state: AddState,
    pub status: Option<String>,
}

impl App {
    pub fn new<S: KeyValueStore + Clone>(session: &Session<S>) -> App {
        let mut app = App {
            view: None,
            rows: Vec::new(),
            state: TableState::default(),
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            status: None,
        };
        app.reload(session);
        app
    }

    /// Rebuilds the view model from the session.
    pub fn reload<S: KeyValueStore + Clone>(&mut self, session: &Session<S>) {
        self.view = session.view().ok();
        self.rows.clear();
        match &self.view {
            Some(view) => {
                let sections = [
                    (Section::Overdue, &view.overdue),
                    (Section::Pending, &view.pending),
                    (Section::Completed, &view.completed),
                ];
                for (section, tasks) in sections {
                    self.rows.extend(tasks.iter().cloned().map(|t| (section, t)));
                }
            }
            None if self.input_mode != InputMode::Login => {
                self.input_mode = InputMode::Login;
                self.input_buffer.clear();
            }
            None => {}
        }

        if self.rows.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.rows.len() {
                self.state.select(Some(self.rows.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    /// Selects the next row.
    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous row.
    pub fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn selected(&self) -> Option<&Task> {
        self.state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|(_, t)| t)
    }

    pub fn toggle_selected<S: KeyValueStore + Clone>(&mut self, session: &mut Session<S>) {
        if let Some(id) = self.selected().map(|t| t.id.clone()) {
            let result = session.toggle_completed(&id).map(|_| ());
            self.finish(session, result);
        }
    }

    pub fn delete_selected<S: KeyValueStore + Clone>(&mut self, session: &mut Session<S>) {
        if let Some(id) = self.selected().map(|t| t.id.clone()) {
            let result = session.delete_task(&id).map(|t| format!("Removed '{}'", t.title));
            self.finish_with(session, result);
        }
    }

    pub fn logout<S: KeyValueStore + Clone>(&mut self, session: &mut Session<S>) {
        let result = session.logout();
        self.finish(session, result);
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        let Some(t) = self.selected() else { return };
        let prefill = match field {
            InputField::Title => t.title.clone(),
            InputField::Due => t.due_date.map(|d| d.to_string()).unwrap_or_default(),
            InputField::Priority => t.priority.to_string(),
            InputField::Recur => t.recurrence.to_string(),
            InputField::None => String::new(),
        };
        self.target_id = Some(t.id.clone());
        self.input_mode = InputMode::Editing;
        self.input_field = field;
        self.input_buffer = prefill;
    }

    pub fn cancel_input(&mut self) {
        if self.input_mode != InputMode::Login {
            self.input_mode = InputMode::Normal;
        }
        self.input_buffer.clear();
    }

    /// Handles Enter based on the current mode.
    pub fn handle_input<S: KeyValueStore + Clone>(&mut self, session: &mut Session<S>) {
        match self.input_mode {
            InputMode::Login => {
                let result = session.login(&self.input_buffer);
                if result.is_ok() {
                    self.input_mode = InputMode::Normal;
                    self.state.select(None);
                }
                self.finish(session, result);
            }
            InputMode::Adding => self.handle_adding_input(session),
            InputMode::Editing => self.handle_editing_input(session),
            InputMode::Normal => {}
        }
    }

    /// Handles input for the "Add Task" wizard.
    fn handle_adding_input<S: KeyValueStore + Clone>(&mut self, session: &mut Session<S>) {
        let raw = std::mem::take(&mut self.input_buffer);
        let step = match self.add_state.step {
            0 => validate_title(&raw).map(|t| self.add_state.new.title = t),
            1 => parse_due_date(&raw).map(|d| self.add_state.new.due_date = d),
            2 => raw.parse::<Priority>().map(|p| self.add_state.new.priority = p),
            3 => raw.parse::<Recurrence>().map(|r| self.add_state.new.recurrence = r),
            _ => Ok(()),
        };
        if let Err(e) = step {
            self.status = Some(e.to_string());
            return;
        }
        if self.add_state.step < 3 {
            self.add_state.step += 1;
            return;
        }

        let new = std::mem::take(&mut self.add_state).new;
        let result = session
            .create_task(new)
            .map(|t| format!("Added '{}'", t.title));
        self.input_mode = InputMode::Normal;
        self.finish_with(session, result);
    }

    /// Handles input for the "Edit Task" mode.
    fn handle_editing_input<S: KeyValueStore + Clone>(&mut self, session: &mut Session<S>) {
        let Some(id) = self.target_id.take() else { return };
        let raw = std::mem::take(&mut self.input_buffer);
        let patch = match self.input_field {
            InputField::Title => Ok(TaskPatch {
                title: Some(raw),
                ..TaskPatch::default()
            }),
            InputField::Due => parse_due_date(&raw).map(|d| TaskPatch {
                due_date: Some(d),
                ..TaskPatch::default()
            }),
            InputField::Priority => raw.parse::<Priority>().map(|p| TaskPatch {
                priority: Some(p),
                ..TaskPatch::default()
            }),
            InputField::Recur => raw.parse::<Recurrence>().map(|r| TaskPatch {
                recurrence: Some(r),
                ..TaskPatch::default()
            }),
            InputField::None => Ok(TaskPatch::default()),
        };
        self.input_mode = InputMode::Normal;
        let result = patch.and_then(|p| session.update_task(&id, &p).map(|_| ()));
        self.finish(session, result);
    }

    /// Runs a recurrence tick if one is due and reloads when tasks were added.
    pub fn on_tick<S: KeyValueStore + Clone>(&mut self, session: &mut Session<S>) {
        match session.poll_tick(std::time::Instant::now()) {
            Ok(spawned) if !spawned.is_empty() => {
                self.status = Some(format!("{} recurring task(s) created", spawned.len()));
                self.reload(session);
            }
            Ok(_) => {
                // Date may have rolled over; overdue grouping depends on it.
                self.reload(session);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn finish<S: KeyValueStore + Clone>(&mut self, session: &Session<S>, result: Result<()>) {
        self.finish_with(session, result.map(|_| String::new()));
    }

    fn finish_with<S: KeyValueStore + Clone>(&mut self, session: &Session<S>, result: Result<String>) {
        self.status = match result {
            Ok(msg) if msg.is_empty() => None,
            Ok(msg) => Some(msg),
            Err(e) => Some(e.to_string()),
        };
        self.reload(session);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::storage::{Gateway, MemoryStore};

    fn logged_in() -> Session<MemoryStore> {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut session = Session::new(Gateway::new(MemoryStore::new()), Duration::from_secs(60))
            .with_clock(move || today);
        session.login("ann").unwrap();
        session
    }

    fn submit(app: &mut App, session: &mut Session<MemoryStore>, input: &str) {
        app.input_buffer = input.to_string();
        app.handle_input(session);
    }

    #[test]
    fn add_wizard_rejects_blank_title_at_first_step() {
        let mut session = logged_in();
        let mut app = App::new(&session);
        app.start_add();

        submit(&mut app, &mut session, "   ");
        assert_eq!(app.add_state.step, 0);
        assert_eq!(app.input_mode, InputMode::Adding);
        assert!(app.status.is_some());

        for input in ["Walk dog", "2024-06-11", "high", "weekly"] {
            submit(&mut app, &mut session, input);
        }
        assert_eq!(app.input_mode, InputMode::Normal);
        let tasks = session.tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Walk dog");
        assert_eq!(tasks[0].recurrence, Recurrence::Weekly);
    }
}
