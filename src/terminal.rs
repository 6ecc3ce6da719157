use crate::domain::Key;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TerminalEvent {
    Key(Key),
    Resize { rows: u16 },
    Interrupt,
}

pub(crate) fn setup_terminal() -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(io::stdout(), EnterAlternateScreen).context("failed to enter alternate screen")?;
    Ok(())
}

pub(crate) fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Waits up to `timeout` for the next event the session cares about.
pub(crate) fn poll_event(timeout: Duration) -> Result<Option<TerminalEvent>> {
    if !event::poll(timeout).context("event poll failed")? {
        return Ok(None);
    }
    let raw = event::read().context("event read failed")?;
    Ok(translate(raw))
}

fn translate(raw: Event) -> Option<TerminalEvent> {
    match raw {
        Event::Key(key) if key.kind == KeyEventKind::Release => None,
        Event::Key(key)
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') =>
        {
            Some(TerminalEvent::Interrupt)
        }
        Event::Key(key) => logical_key(key).map(TerminalEvent::Key),
        Event::Resize(_, rows) => Some(TerminalEvent::Resize { rows }),
        _ => None,
    }
}

pub(crate) fn logical_key(key: KeyEvent) -> Option<Key> {
    let key = match key.code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(_) if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            return None;
        }
        KeyCode::Char(ch) => Key::Char(ch),
        _ => return None,
    };
    Some(key)
}
