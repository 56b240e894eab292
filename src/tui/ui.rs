use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputField, InputMode, Section};
use crate::models::Priority;

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    let (percent, title) = match &app.view {
        Some(view) => (
            view.progress_percent.min(100) as u16,
            format!(
                "Tasktide - {} done of {} ({} overdue)",
                view.completed.len(),
                view.total(),
                view.overdue.len()
            ),
        ),
        None => (0, "Tasktide".to_string()),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(percent);
    f.render_widget(gauge, chunks[0]);

    let today = app.view.as_ref().map(|v| v.today);
    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|(section, t)| {
            let style = match section {
                Section::Overdue => Style::default().fg(Color::Red),
                Section::Pending => Style::default(),
                Section::Completed => Style::default().fg(Color::DarkGray),
            };
            let due = match t.due_date {
                Some(d) if Some(d) == today => "Today".to_string(),
                Some(d) => d.to_string(),
                None => String::new(),
            };
            let priority_style = match t.priority {
                Priority::High => Style::default().fg(Color::Red),
                Priority::Medium => Style::default().fg(Color::Yellow),
                Priority::Low => Style::default().fg(Color::Blue),
                Priority::None => Style::default(),
            };
            Row::new(vec![
                Cell::from(section.label()),
                Cell::from(t.title.clone()),
                Cell::from(due),
                Cell::from(t.priority.label()).style(priority_style),
                Cell::from(t.recurrence.label()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Status", "Title", "Due", "Priority", "Repeats"])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, chunks[1], &mut app.state);

    let help_text = match (&app.status, app.input_mode) {
        (Some(status), _) => status.clone(),
        (None, InputMode::Normal) => {
            "q: Quit | a: Add | n: Title | t: Due | p: Priority | r: Recur | Space: Toggle Done | d: Del | L: Log out".to_string()
        }
        (None, InputMode::Login) => "Enter: Log in | Esc: Quit".to_string(),
        (None, InputMode::Editing) => "Enter: Save | Esc: Cancel".to_string(),
        (None, InputMode::Adding) => "Enter: Next Step | Esc: Cancel".to_string(),
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[2]);

    if app.input_mode == InputMode::Normal {
        return;
    }

    let area = centered_rect(60, 3, f.area());
    f.render_widget(Clear, area);

    let title = match app.input_mode {
        InputMode::Login => "Log in: Enter User Name",
        InputMode::Adding => match app.add_state.step {
            0 => "Add Task: Enter Title",
            1 => "Add Task: Enter Due Date (YYYY-MM-DD, Optional)",
            2 => "Add Task: Enter Priority (low/medium/high, Optional)",
            3 => "Add Task: Enter Recurrence (daily/weekly/monthly, Optional)",
            _ => "Add Task",
        },
        InputMode::Editing => match app.input_field {
            InputField::Title => "Edit Title",
            InputField::Due => "Edit Due Date (YYYY-MM-DD, empty to clear)",
            InputField::Priority => "Edit Priority",
            InputField::Recur => "Edit Recurrence",
            InputField::None => "Edit",
        },
        InputMode::Normal => "",
    };

    let input = Paragraph::new(app.input_buffer.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(input, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
