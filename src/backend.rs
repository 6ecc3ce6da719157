use crate::app::{BackendEvent, BackendTask};
use crate::command::execute;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

/// Runs submitted commands one at a time. Each command blocks a pooled
/// thread until its walk completes; the next task is not started before
/// the previous outcome has been sent back.
pub(crate) async fn worker_loop(
    mut task_rx: UnboundedReceiver<BackendTask>,
    event_tx: UnboundedSender<BackendEvent>,
) {
    while let Some(task) = task_rx.recv().await {
        match task {
            BackendTask::Run { command, context } => {
                let name = command.name();
                debug!(command = name, "worker picked up command");
                let result =
                    tokio::task::spawn_blocking(move || execute(&command, &context)).await;

                let event = match result {
                    Ok(outcome) => BackendEvent::Finished(outcome),
                    Err(err) => {
                        error!(command = name, error = %err, "command task failed");
                        BackendEvent::Error {
                            context: name.to_string(),
                            message: format!("command task failed: {err}"),
                        }
                    }
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        }
    }
}
