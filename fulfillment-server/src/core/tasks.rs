//! Background task management
//!
//! Registry for the engine's long-running tasks with a shared cancellation
//! token for coordinated shutdown.
//!
//! # Task kinds
//!
//! - [`TaskKind::Worker`] - long-lived background worker
//! - [`TaskKind::Periodic`] - fixed-interval job (sweep, verify)

use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Task kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Long-lived background worker
    Worker,
    /// Fixed-interval job
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

struct RegisteredTask {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// Background task registry
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    cancel: CancellationToken,
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token handed to tasks so they can observe shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn and register a task; panics are caught and logged, never fatal
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if AssertUnwindSafe(future).catch_unwind().await.is_err() {
                tracing::error!(task = name, "Background task panicked");
            }
        });
        tracing::info!(task = name, kind = %kind, "Background task started");
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    /// Spawn a periodic task running `job` every `period`
    pub fn spawn_periodic<F>(
        &mut self,
        name: &'static str,
        period: std::time::Duration,
        job: F,
    ) where
        F: Fn() + Send + Sync + 'static,
    {
        let cancel = self.cancel.clone();
        self.spawn(name, TaskKind::Periodic, async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => job(),
                    _ = cancel.cancelled() => break,
                }
            }
            tracing::info!(task = name, "Periodic task stopped");
        });
    }

    /// Signal shutdown and wait for every task to finish
    pub async fn shutdown(self, timeout: std::time::Duration) {
        self.cancel.cancel();
        for task in self.tasks {
            if tokio::time::timeout(timeout, task.handle).await.is_err() {
                tracing::warn!(task = task.name, kind = %task.kind, "Task did not stop in time");
            }
        }
    }
}
