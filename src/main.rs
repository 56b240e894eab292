//! tasktide - personal task tracker
//!
//! Run without arguments (or with `ui`) for the interactive terminal UI, or
//! use the subcommands for quick scripted entry:
//!
//! ```bash
//! tasktide login ann
//! tasktide add "Pay rent" --due 2025-01-31 --priority high --recur monthly
//! tasktide list
//! tasktide toggle <ID>
//! ```
//!
//! State lives in the platform data directory (`~/.local/share/tasktide` on
//! Linux) unless `TASKTIDE_HOME` points elsewhere. Set `RUST_LOG=tasktide=debug`
//! for diagnostics on stderr.

use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tasktide::commands::*;
use tasktide::config::Config;
use tasktide::session::Session;
use tasktide::storage::{FileStore, Gateway};
use tasktide::tui::run_tui;
use tasktide::Result;

#[derive(Parser)]
#[command(name = "tasktide")]
#[command(about = "Personal task tracker with recurring tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as a user (created on first login)
    Login {
        user: String,
    },
    /// Log out the current user
    Logout,
    /// Print the current user
    Whoami,
    /// List every user that has logged in
    Users,
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: Option<String>,
        /// Priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<String>,
        /// Recurrence (daily, weekly, monthly)
        #[arg(short, long)]
        recur: Option<String>,
    },
    /// Edit a task
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New due date in YYYY-MM-DD
        #[arg(short, long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        /// New priority (none, low, medium, high)
        #[arg(short, long)]
        priority: Option<String>,
        /// New recurrence (none, daily, weekly, monthly)
        #[arg(short, long)]
        recur: Option<String>,
    },
    /// Flip a task between done and pending
    Toggle {
        id: String,
    },
    /// Mark a task as complete
    Done {
        id: String,
    },
    /// Mark a task as pending again
    Undo {
        id: String,
    },
    /// Remove a task
    Remove {
        id: String,
    },
    /// List tasks grouped as overdue, pending and completed
    List {
        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create due occurrences of recurring tasks now
    Tick,
    /// Keep creating occurrences of recurring tasks on a timer
    Watch {
        /// Stop after this many evaluations
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

fn main() {
    // Tracing is opt-in via RUST_LOG; an invalid filter is ignored.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "tasktide", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load()?;
    let gateway = Gateway::new(FileStore::new(&config.data_dir));
    let mut session = Session::new(gateway, config.tick_interval());

    if let Some(Commands::Login { user }) = &cli.command {
        return cmd_login(&mut session, user);
    }
    session.restore()?;

    match cli.command {
        Some(Commands::Logout) => cmd_logout(&mut session),
        Some(Commands::Whoami) => cmd_whoami(&session),
        Some(Commands::Users) => cmd_users(&session),
        Some(Commands::Add { title, due, priority, recur }) => {
            cmd_add(&mut session, &title, due.as_deref(), priority.as_deref(), recur.as_deref()).map(|_| ())
        }
        Some(Commands::Edit { id, title, due, clear_due, priority, recur }) => cmd_edit(
            &mut session,
            &id,
            title.as_deref(),
            due.as_deref(),
            clear_due,
            priority.as_deref(),
            recur.as_deref(),
        )
        .map(|_| ()),
        Some(Commands::Toggle { id }) => cmd_toggle(&mut session, &id).map(|_| ()),
        Some(Commands::Done { id }) => cmd_set_done(&mut session, &id, true).map(|_| ()),
        Some(Commands::Undo { id }) => cmd_set_done(&mut session, &id, false).map(|_| ()),
        Some(Commands::Remove { id }) => cmd_remove(&mut session, &id).map(|_| ()),
        Some(Commands::List { json }) => cmd_list(&session, json),
        Some(Commands::Tick) => cmd_tick(&mut session).map(|_| ()),
        Some(Commands::Watch { ticks }) => cmd_watch(&mut session, ticks),
        Some(Commands::Ui) | None => run_tui(&mut session),
        Some(Commands::Login { .. }) | Some(Commands::Completions { .. }) => Ok(()),
    }
}
