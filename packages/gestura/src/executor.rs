//! Fire-and-forget command execution.
//!
//! The pipeline hands [`FiredAction`]s over an unbounded channel and never
//! waits. Each command runs under `sh -c`; a detached task waits for it and
//! then raises a desktop notification.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use gesture_core::FiredAction;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shown after a bound command exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn for_action(trigger: &str, command: &str) -> Self {
        let program = command
            .split_whitespace()
            .next()
            .map(|word| {
                Path::new(word)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| word.to_string())
            })
            .unwrap_or_else(|| command.to_string());
        Self {
            title: format!("Gestura: '{trigger}' triggered"),
            body: format!("Running: {program}"),
        }
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: &Notification);
}

/// Desktop notifications through `notify-send`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifySend;

impl Notifier for NotifySend {
    fn notify(&self, notification: &Notification) {
        let spawned = Command::new("notify-send")
            .arg(&notification.title)
            .arg(&notification.body)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(err) = spawned {
            warn!(error = %err, "failed to show notification");
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self, _notification: &Notification) {}
}

/// Result of one command, reported to an optional observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionReport {
    Finished {
        trigger: String,
        status: Option<i32>,
    },
    Failed {
        trigger: String,
        reason: String,
    },
}

pub struct ActionExecutor {
    tx: mpsc::UnboundedSender<FiredAction>,
    worker: JoinHandle<()>,
}

impl ActionExecutor {
    pub fn spawn(notifier: Arc<dyn Notifier>) -> Self {
        Self::spawn_with_reports(notifier, None)
    }

    pub fn spawn_with_reports(
        notifier: Arc<dyn Notifier>,
        reports: Option<mpsc::UnboundedSender<ExecutionReport>>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<FiredAction>();
        let worker = tokio::spawn(async move {
            let mut running = Vec::new();
            while let Some(action) = rx.recv().await {
                running.retain(|task: &JoinHandle<()>| !task.is_finished());
                running.push(run_action(action, Arc::clone(&notifier), reports.clone()));
            }
            // Channel closed: let started commands finish reporting.
            for task in running {
                let _ = task.await;
            }
        });
        Self { tx, worker }
    }

    /// Never blocks. A closed executor drops the action with a warning.
    pub fn submit(&self, action: FiredAction) {
        if let Err(err) = self.tx.send(action) {
            warn!(trigger = %err.0.trigger, "executor stopped, action dropped");
        }
    }

    /// Stops accepting actions and waits for commands already started.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(err) = self.worker.await {
            warn!(error = %err, "executor task failed");
        }
    }
}

fn run_action(
    action: FiredAction,
    notifier: Arc<dyn Notifier>,
    reports: Option<mpsc::UnboundedSender<ExecutionReport>>,
) -> JoinHandle<()> {
    info!(trigger = %action.trigger, command = %action.command, kind = ?action.kind, "executing action");

    let spawned = Command::new("sh")
        .arg("-c")
        .arg(&action.command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    tokio::spawn(async move {
        let report = match spawned {
            Err(err) => {
                warn!(trigger = %action.trigger, command = %action.command, error = %err, "failed to start command");
                ExecutionReport::Failed {
                    trigger: action.trigger,
                    reason: err.to_string(),
                }
            }
            Ok(mut child) => {
                let status = child.wait().await;
                notifier.notify(&Notification::for_action(&action.trigger, &action.command));
                finished(action.trigger, status)
            }
        };
        if let Some(reports) = reports {
            let _ = reports.send(report);
        }
    })
}

fn finished(trigger: String, status: std::io::Result<ExitStatus>) -> ExecutionReport {
    match status {
        Ok(status) => {
            if !status.success() {
                debug!(trigger = %trigger, %status, "command exited unsuccessfully");
            }
            ExecutionReport::Finished {
                trigger,
                status: status.code(),
            }
        }
        Err(err) => {
            warn!(trigger = %trigger, error = %err, "failed to wait for command");
            ExecutionReport::Failed {
                trigger,
                reason: err.to_string(),
            }
        }
    }
}
