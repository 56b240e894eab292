pub mod app;
pub mod ui;

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::error::Result;
use crate::session::Session;
use crate::storage::KeyValueStore;
use app::{App, InputField, InputMode};
use ui::ui;

/// Longest wait between redraws, so a date rollover shows up promptly.
const MAX_IDLE: Duration = Duration::from_secs(30);

pub fn run_tui<S: KeyValueStore + Clone>(session: &mut Session<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = run_app(&mut terminal, &mut app, session);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend, S: KeyValueStore + Clone>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    session: &mut Session<S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = session
            .schedule()
            .remaining(Instant::now())
            .map_or(MAX_IDLE, |left| left.min(MAX_IDLE));
        if !event::poll(timeout)? {
            app.on_tick(session);
            continue;
        }

        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char(' ') => app.toggle_selected(session),
                KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(session),
                KeyCode::Char('a') => app.start_add(),
                KeyCode::Char('n') => app.start_edit(InputField::Title),
                KeyCode::Char('t') => app.start_edit(InputField::Due),
                KeyCode::Char('p') => app.start_edit(InputField::Priority),
                KeyCode::Char('r') => app.start_edit(InputField::Recur),
                KeyCode::Char('L') => app.logout(session),
                _ => {}
            },
            InputMode::Login | InputMode::Editing | InputMode::Adding => match key.code {
                KeyCode::Enter => app.handle_input(session),
                KeyCode::Esc if app.input_mode == InputMode::Login => return Ok(()),
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Char(c) => app.input_buffer.push(c),
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                }
                _ => {}
            },
        }
    }
}
