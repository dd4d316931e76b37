//! Task management for the zone service lifecycle.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long a task may take to observe cancellation during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the background tasks and their shared stop signal.
///
/// Every task receives a child of `global_token`; cancelling the global
/// token stops all of them at their next suspension point.
pub struct TaskManager {
    tasks: HashMap<String, JoinHandle<Result<()>>>,
    pub global_token: CancellationToken,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            global_token: CancellationToken::new(),
        }
    }

    /// Spawns and registers a task under `name`.
    pub async fn spawn_task<F, Fut>(&mut self, name: String, task_fn: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        if self.tasks.contains_key(&name) {
            return Err(anyhow!("Task '{name}' is already running"));
        }

        let token = self.global_token.child_token();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            info!("Starting task: {task_name}");
            let result = task_fn(token).await;
            match &result {
                Ok(()) => info!("Task '{task_name}' finished"),
                Err(e) => error!("Task '{task_name}' failed: {e:#}"),
            }
            result
        });

        self.tasks.insert(name.clone(), handle);
        info!("Task '{name}' spawned");
        Ok(())
    }

    /// Cancels every task and waits for all of them to finish.
    ///
    /// Returns the first error encountered, if any.
    pub async fn shutdown_all(&mut self) -> Result<()> {
        info!("Stopping all {} tasks", self.tasks.len());
        self.global_token.cancel();

        let mut first_error = None;
        for (name, handle) in self.tasks.drain() {
            let error = match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(Ok(()))) => continue,
                Ok(Ok(Err(e))) => e.context(format!("Task '{name}' failed")),
                Ok(Err(e)) => anyhow!("Task '{name}' panicked: {e}"),
                Err(_) => anyhow!("Task '{name}' did not stop within {SHUTDOWN_TIMEOUT:?}"),
            };
            error!("{error:#}");
            first_error.get_or_insert(error);
        }

        match first_error {
            Some(error) => Err(error).context("One or more tasks failed during shutdown"),
            None => {
                info!("All tasks stopped");
                Ok(())
            }
        }
    }

    /// Used only for testing purposes.
    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Used only for testing purposes.
    #[cfg(test)]
    pub fn is_running(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Names of registered tasks, sorted. Used only for testing purposes.
    #[cfg(test)]
    pub fn task_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
