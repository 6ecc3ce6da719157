use crate::app::{App, BackendEvent, BackendTask};
use crate::command::Command;
use crate::domain::Key;
use crate::error::CommandError;
use crate::mode::{LineEdit, Mode};
use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

pub(crate) fn handle_backend_event(app: &mut App, event: BackendEvent) {
    app.busy = false;
    match event {
        BackendEvent::Finished(outcome) => app.apply_outcome(outcome),
        BackendEvent::Error { context, message } => {
            app.report_error(format!("{context}: {message}"));
        }
    }
}

pub(crate) fn handle_key(
    app: &mut App,
    key: Key,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    if app.mode.is_command() {
        return handle_command_key(app, key, task_tx);
    }

    match key {
        Key::Up => {
            app.move_up();
        }
        Key::Down => {
            app.move_down();
        }
        Key::Left => app.go_back(),
        Key::Right => app.go_forward(),
        Key::Enter => app.open_selected(),
        Key::Char('h' | 'H') => app.go_home(),
        Key::Backspace => app.go_up(),
        Key::Char(':') => app.enter_command_mode(),
        Key::Escape => app.should_quit = true,
        Key::Char(_) => {}
    }
    Ok(())
}

fn handle_command_key(
    app: &mut App,
    key: Key,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    let Mode::Command(line) = &mut app.mode else {
        return Ok(());
    };

    match line.apply(key) {
        LineEdit::Editing => Ok(()),
        LineEdit::Cancelled => {
            app.leave_command_mode();
            Ok(())
        }
        LineEdit::Submitted(text) => {
            app.leave_command_mode();
            submit_command(app, &text, task_tx)
        }
    }
}

pub(crate) fn submit_command(
    app: &mut App,
    line: &str,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(CommandError::Empty) => return Ok(()),
        Err(err) => {
            debug!(line, error = %err, "rejected command line");
            app.report_error(err.to_string());
            return Ok(());
        }
    };

    app.log(format!("{}{line}", crate::mode::PROMPT));
    let context = app.command_context();
    send_task(app, task_tx, BackendTask::Run { command, context })
}

pub(crate) fn send_task(
    app: &mut App,
    task_tx: &UnboundedSender<BackendTask>,
    task: BackendTask,
) -> Result<()> {
    app.busy = true;
    task_tx
        .send(task)
        .map_err(|err| anyhow::anyhow!("failed to dispatch task: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutcome, Effect};
    use crate::config::AppConfig;
    use crate::domain::Severity;
    use crate::engine::OpReport;
    use crate::testutil::Scratch;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    fn app_at(scratch: &Scratch) -> App {
        App::new(AppConfig::default(), scratch.path().to_path_buf(), 24)
    }

    fn type_line(app: &mut App, text: &str, task_tx: &UnboundedSender<BackendTask>) {
        handle_key(app, Key::Char(':'), task_tx).expect("handle key");
        for ch in text.chars() {
            handle_key(app, Key::Char(ch), task_tx).expect("handle key");
        }
        handle_key(app, Key::Enter, task_tx).expect("handle key");
    }

    #[test]
    fn submitted_command_is_dispatched_with_session_context() {
        let scratch = Scratch::new("handlers_submit");
        let mut app = app_at(&scratch);
        let (task_tx, mut task_rx) = mpsc::unbounded_channel::<BackendTask>();

        type_line(&mut app, "delete_file old\\ notes.txt", &task_tx);

        assert!(app.busy);
        assert!(!app.mode.is_command());
        let BackendTask::Run { command, context } = task_rx.try_recv().expect("task dispatched");
        assert_eq!(
            command,
            Command::DeleteFile {
                path: "old notes.txt".to_string()
            }
        );
        assert_eq!(context.working_dir, scratch.path());
        assert_eq!(app.logs.last().map(String::as_str), Some(":delete_file old\\ notes.txt"));
    }

    #[test]
    fn malformed_command_shows_usage_and_dispatches_nothing() {
        let scratch = Scratch::new("handlers_usage");
        let mut app = app_at(&scratch);
        let (task_tx, mut task_rx) = mpsc::unbounded_channel::<BackendTask>();

        type_line(&mut app, "rename only", &task_tx);

        assert!(task_rx.try_recv().is_err());
        assert!(!app.busy);
        let status = app.status.as_ref().expect("status");
        assert_eq!(status.severity, Severity::Error);
        assert_eq!(status.text, "usage: rename OLD NEW");
    }

    #[test]
    fn escape_in_command_mode_discards_the_line() {
        let scratch = Scratch::new("handlers_escape");
        let mut app = app_at(&scratch);
        let (task_tx, mut task_rx) = mpsc::unbounded_channel::<BackendTask>();

        handle_key(&mut app, Key::Char(':'), &task_tx).expect("handle key");
        handle_key(&mut app, Key::Char('x'), &task_tx).expect("handle key");
        handle_key(&mut app, Key::Escape, &task_tx).expect("handle key");

        assert!(!app.mode.is_command());
        assert!(!app.should_quit);
        assert!(task_rx.try_recv().is_err());
    }

    #[test]
    fn escape_in_normal_mode_quits() {
        let scratch = Scratch::new("handlers_quit");
        let mut app = app_at(&scratch);
        let (task_tx, _task_rx) = mpsc::unbounded_channel::<BackendTask>();

        handle_key(&mut app, Key::Escape, &task_tx).expect("handle key");
        assert!(app.should_quit);
    }

    #[test]
    fn navigation_keys_drive_history() {
        let scratch = Scratch::new("handlers_nav");
        let sub = scratch.mkdir("sub");
        let mut app = app_at(&scratch);
        let (task_tx, _task_rx) = mpsc::unbounded_channel::<BackendTask>();

        handle_key(&mut app, Key::Down, &task_tx).expect("handle key");
        handle_key(&mut app, Key::Down, &task_tx).expect("handle key");
        handle_key(&mut app, Key::Enter, &task_tx).expect("handle key");
        assert_eq!(app.working_dir(), sub.as_path());

        handle_key(&mut app, Key::Backspace, &task_tx).expect("handle key");
        assert_eq!(app.working_dir(), scratch.path());

        handle_key(&mut app, Key::Left, &task_tx).expect("handle key");
        assert_eq!(app.working_dir(), sub.as_path());

        handle_key(&mut app, Key::Char('H'), &task_tx).expect("handle key");
        assert_eq!(app.working_dir(), scratch.path());
        assert!(!app.navigator().can_go_forward());
    }

    #[test]
    fn finished_event_clears_busy_and_sets_status() {
        let scratch = Scratch::new("handlers_event");
        let mut app = app_at(&scratch);
        app.busy = true;

        handle_backend_event(
            &mut app,
            BackendEvent::Finished(CommandOutcome {
                command: "snapshot",
                effect: Effect::Nothing,
                report: OpReport {
                    done: 2,
                    ..OpReport::default()
                },
            }),
        );

        assert!(!app.busy);
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some("snapshot: 2 done")
        );
    }
}
