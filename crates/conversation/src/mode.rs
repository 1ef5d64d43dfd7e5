//! Conversation mode lifecycle
//!
//! Owns the controller task. `activate` spawns the loop; `deactivate` is the
//! uniform exit: from any phase it cancels the task (and with it every
//! pending timer and the capture window), stops the adapters and settles the
//! phase back to `Idle`. Both are idempotent.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::controller::TurnController;

struct ModeInner {
    task: Option<JoinHandle<()>>,
    shutdown: Option<broadcast::Sender<()>>,
}

/// Toggles the hands-free loop on and off
pub struct ConversationMode {
    controller: Arc<TurnController>,
    inner: Mutex<ModeInner>,
}

impl ConversationMode {
    pub fn new(controller: Arc<TurnController>) -> Self {
        Self {
            controller,
            inner: Mutex::new(ModeInner {
                task: None,
                shutdown: None,
            }),
        }
    }

    /// The controller this mode drives
    pub fn controller(&self) -> &Arc<TurnController> {
        &self.controller
    }

    /// Whether the loop task is currently running
    pub fn is_active(&self) -> bool {
        self.inner
            .lock()
            .task
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    /// Turn conversation mode on. No-op when already active.
    pub fn activate(&self) {
        let mut inner = self.inner.lock();
        if inner.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false) {
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let controller = Arc::clone(&self.controller);
        let generation = controller.begin_generation();

        let task = tokio::spawn(async move {
            let (reason, fatal) = tokio::select! {
                _ = shutdown_rx.recv() => ("deactivated".to_string(), false),
                exit = controller.run_loop(generation) => (exit.reason(), exit.is_fatal()),
            };
            controller.finish(reason, fatal).await;
        });

        inner.task = Some(task);
        inner.shutdown = Some(shutdown_tx);
    }

    /// Turn conversation mode off and wait until the loop is fully quiesced:
    /// no pending timers, no capture window, no playback, submission gate
    /// released. Idempotent.
    pub async fn deactivate(&self) {
        let (task, shutdown) = {
            let mut inner = self.inner.lock();
            (inner.task.take(), inner.shutdown.take())
        };

        let Some(task) = task else {
            return;
        };

        if let Some(shutdown) = shutdown {
            // Fails only when the task already exited on its own
            let _ = shutdown.send(());
        }

        if let Err(e) = task.await {
            tracing::error!(error = %e, "conversation loop task panicked");
        }
    }
}
