use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Task;

/// Returns true if the task is incomplete and its due date is strictly
/// before `today`. Tasks without a due date are never overdue.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < today)
}

/// Disjoint partition of a collection. Each group keeps collection order.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Categories {
    pub overdue: Vec<Task>,
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
}

pub fn categorize(tasks: &[Task], today: NaiveDate) -> Categories {
    let mut groups = Categories::default();
    for t in tasks {
        if t.completed {
            groups.completed.push(t.clone());
        } else if is_overdue(t, today) {
            groups.overdue.push(t.clone());
        } else {
            groups.pending.push(t.clone());
        }
    }
    groups
}

/// Percentage of completed tasks, rounded to the nearest integer.
/// An empty collection is 0%.
pub fn progress(tasks: &[Task]) -> u32 {
    if tasks.is_empty() {
        return 0;
    }
    let done = tasks.iter().filter(|t| t.completed).count();
    ((done as f64 * 100.0) / tasks.len() as f64).round() as u32
}

/// Breakdown of pending tasks by when they are due.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Agenda {
    pub today: Vec<Task>,
    pub upcoming: Vec<Task>,
    pub undated: Vec<Task>,
}

/// Splits the pending group of `tasks` into due today, due later, and no
/// due date.
pub fn agenda(tasks: &[Task], today: NaiveDate) -> Agenda {
    let mut agenda = Agenda::default();
    for t in tasks.iter().filter(|t| !t.completed && !is_overdue(t, today)) {
        match t.due_date {
            Some(due) if due == today => agenda.today.push(t.clone()),
            Some(_) => agenda.upcoming.push(t.clone()),
            None => agenda.undated.push(t.clone()),
        }
    }
    agenda
}

/// Everything a presentation layer needs to draw the task list.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub today: NaiveDate,
    pub overdue: Vec<Task>,
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
    pub progress_percent: u32,
    pub agenda: Agenda,
}

impl View {
    pub fn build(tasks: &[Task], today: NaiveDate) -> Self {
        let Categories {
            overdue,
            pending,
            completed,
        } = categorize(tasks, today);
        View {
            today,
            overdue,
            pending,
            completed,
            progress_percent: progress(tasks),
            agenda: agenda(tasks, today),
        }
    }

    pub fn total(&self) -> usize {
        self.overdue.len() + self.pending.len() + self.completed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, TaskId};
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn task(id: &str, due: Option<NaiveDate>, completed: bool) -> Task {
        let mut new = NewTask::titled(id);
        new.due_date = due;
        let mut t = Task::new(TaskId::from(id), new).unwrap();
        t.completed = completed;
        t
    }

    #[test]
    fn overdue_boundary() {
        let yesterday = today() - Days::new(1);
        assert!(!is_overdue(&task("a", Some(today()), false), today()));
        assert!(is_overdue(&task("b", Some(yesterday), false), today()));
        assert!(!is_overdue(&task("c", Some(yesterday), true), today()));
        assert!(!is_overdue(&task("d", None, false), today()));
    }

    #[test]
    fn overdue_compares_across_years() {
        let dec = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(is_overdue(&task("a", Some(dec), false), jan));
        assert!(!is_overdue(&task("b", Some(jan), false), dec));
    }

    fn ids(group: &[Task]) -> Vec<String> {
        group.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn categorize_covers_every_task_once() {
        let tasks = vec![
            task("late", Some(today() - Days::new(3)), false),
            task("now", Some(today()), false),
            task("later", Some(today() + Days::new(3)), false),
            task("someday", None, false),
            task("done-late", Some(today() - Days::new(3)), true),
        ];
        let first = categorize(&tasks, today());
        let second = categorize(&tasks, today());
        assert_eq!(first, second);

        assert_eq!(ids(&first.overdue), ["late"]);
        assert_eq!(ids(&first.pending), ["now", "later", "someday"]);
        assert_eq!(ids(&first.completed), ["done-late"]);
        assert_eq!(
            first.overdue.len() + first.pending.len() + first.completed.len(),
            tasks.len()
        );
    }

    #[test]
    fn progress_rounds() {
        assert_eq!(progress(&[]), 0);
        let three = vec![task("a", None, true), task("b", None, false), task("c", None, false)];
        assert_eq!(progress(&three), 33);
        let four = vec![
            task("a", None, true),
            task("b", None, true),
            task("c", None, false),
            task("d", None, false),
        ];
        assert_eq!(progress(&four), 50);
        let two_of_three = vec![task("a", None, true), task("b", None, true), task("c", None, false)];
        assert_eq!(progress(&two_of_three), 67);
    }

    #[test]
    fn agenda_splits_pending() {
        let tasks = vec![
            task("now", Some(today()), false),
            task("later", Some(today() + Days::new(1)), false),
            task("someday", None, false),
            task("late", Some(today() - Days::new(1)), false),
            task("done", Some(today()), true),
        ];
        let agenda = agenda(&tasks, today());
        assert_eq!(agenda.today.len(), 1);
        assert_eq!(agenda.upcoming.len(), 1);
        assert_eq!(agenda.undated.len(), 1);
    }

    #[test]
    fn view_serializes_progress_in_camel_case() {
        let view = View::build(&[task("a", None, true)], today());
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["progressPercent"], 100);
        assert_eq!(view.total(), 1);
    }
}
