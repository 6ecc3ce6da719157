mod app;
mod backend;
mod command;
mod config;
mod domain;
mod engine;
mod error;
mod handlers;
mod history;
mod listing;
mod logging;
mod mode;
mod resolve;
#[cfg(test)]
mod testutil;
mod terminal;
mod ui;
mod viewport;

use crate::app::{App, BackendEvent, BackendTask};
use crate::backend::worker_loop;
use crate::config::AppConfig;
use crate::handlers::{handle_backend_event, handle_key};
use crate::terminal::{TerminalEvent, poll_event, restore_terminal, setup_terminal};
use anyhow::{Context, Result, bail};
use clap::Parser;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;

/// Terminal file browser confined to one directory tree.
#[derive(Debug, Parser)]
#[command(name = "treenav", version, about)]
struct Cli {
    /// Directory to browse; nothing above it is reachable. Defaults to the
    /// current directory.
    dir: Option<PathBuf>,

    /// Config file to load instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `treenav=trace`. RUST_LOG takes precedence.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load config, using defaults: {err:#}");
            AppConfig::default()
        }
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    let root = match resolve_root(cli.dir.as_deref()) {
        Ok(root) => root,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    };

    let _log_guard = match logging::init(&config) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("logging disabled: {err:#}");
            None
        }
    };
    info!(root = %root.display(), "starting session");

    setup_terminal()?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("failed to create terminal")?;

    let run_result = run_app(&mut terminal, config, root).await;

    restore_terminal(&mut terminal)?;
    if let Err(err) = run_result {
        eprintln!("{err:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn resolve_root(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("could not determine current directory")?,
    };
    let root = dir
        .canonicalize()
        .with_context(|| format!("cannot open {}", dir.display()))?;
    if !root.is_dir() {
        bail!("not a directory: {}", root.display());
    }
    Ok(root)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: AppConfig,
    root: PathBuf,
) -> Result<()> {
    let rows = terminal.size().context("failed to read terminal size")?.height;
    let mut app = App::new(config, root, rows);

    let (task_tx, task_rx) = mpsc::unbounded_channel::<BackendTask>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<BackendEvent>();

    tokio::spawn(worker_loop(task_rx, event_tx));

    while !app.should_quit {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        if app.busy {
            wait_for_worker(&mut app, &mut event_rx).await?;
            continue;
        }

        match poll_event(Duration::from_millis(100))? {
            Some(TerminalEvent::Key(key)) => handle_key(&mut app, key, &task_tx)?,
            Some(TerminalEvent::Resize { rows }) => app.resize(rows),
            Some(TerminalEvent::Interrupt) => app.should_quit = true,
            None => {}
        }
    }

    info!("session ended");
    Ok(())
}

/// Input is not read while a command runs, so every walk completes before
/// the next key is handled.
async fn wait_for_worker(
    app: &mut App,
    event_rx: &mut UnboundedReceiver<BackendEvent>,
) -> Result<()> {
    let event = event_rx
        .recv()
        .await
        .context("command worker stopped unexpectedly")?;
    handle_backend_event(app, event);
    Ok(())
}
