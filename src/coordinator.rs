//! System coordinator for managing service lifecycle and dependency injection.

use std::{future::Future, sync::Arc};

use anyhow::{Context, Result};
use log::{error, info, warn};

use crate::{
    app_context::LightingContext,
    config::SettingsStore,
    driver::GraphicsDriver,
    gate::Pacing,
    notify::{NO_SUPPORTED_ADAPTERS, Notifier},
    providers::{AsyncProvider, LightingContextProvider, ServiceProvider, ZoneServiceProvider},
    task_manager::TaskManager,
};

const NO_ADAPTERS_TITLE: &str = "No supported adapter(s) found.";

/// Drives the daemon from startup to shutdown.
///
/// # Lifecycle
/// 1. [`initialize`](Self::initialize) detects the backends and builds the
///    shared lighting context.
/// 2. [`start_all_services`](Self::start_all_services) starts one zone
///    service per zone, or notifies the user once when there is nothing to
///    control.
/// 3. [`run_main_loop`](Self::run_main_loop) idles until Ctrl+C or SIGTERM
///    and then joins every task.
pub struct SystemCoordinator {
    task_manager: TaskManager,
    context: Option<Arc<LightingContext>>,
    service_providers: Vec<Box<dyn ServiceProvider>>,
    notifier: Arc<dyn Notifier>,
    pacing: Pacing,
    notified: bool,
}

impl SystemCoordinator {
    pub fn new(notifier: Arc<dyn Notifier>, pacing: Pacing) -> Self {
        Self {
            task_manager: TaskManager::new(),
            context: None,
            service_providers: Vec::new(),
            notifier,
            pacing,
            notified: false,
        }
    }

    /// Builds the lighting context and registers the zone services.
    pub async fn initialize(
        &mut self,
        settings: SettingsStore,
        drivers: Vec<Arc<dyn GraphicsDriver>>,
    ) -> Result<()> {
        info!("Initializing SystemCoordinator...");
        info!("Settings file: {}", settings.path().display());

        let provider = LightingContextProvider::new(settings, drivers, self.pacing);
        self.context = provider
            .provide()
            .await
            .context("Failed to initialize lighting context")?;

        self.register_service_providers();

        info!("SystemCoordinator initialization completed");
        Ok(())
    }

    fn register_service_providers(&mut self) {
        let mut providers: Vec<Box<dyn ServiceProvider>> = match &self.context {
            Some(context) => ZoneServiceProvider::for_all_zones(context)
                .into_iter()
                .map(|p| Box::new(p) as Box<dyn ServiceProvider>)
                .collect(),
            None => Vec::new(),
        };

        providers.sort_by_key(|b| std::cmp::Reverse(b.priority()));
        self.service_providers = providers;

        info!(
            "Registered {} service providers in priority order",
            self.service_providers.len()
        );
    }

    /// Starts all registered services in priority order.
    ///
    /// Critical services must start successfully, while non-critical services
    /// can fail without stopping the system.
    pub async fn start_all_services(&mut self) -> Result<()> {
        if self.service_providers.is_empty() {
            if !self.notified {
                self.notifier.notify(NO_ADAPTERS_TITLE, NO_SUPPORTED_ADAPTERS);
                self.notified = true;
            }
            return Ok(());
        }

        info!(
            "Starting {} services in priority order...",
            self.service_providers.len()
        );

        for provider in &self.service_providers {
            let is_critical = provider.is_critical();

            match provider.start(&mut self.task_manager).await {
                Ok(()) => {
                    info!(
                        "Service '{}' started successfully (priority: {}, critical: {})",
                        provider.name(),
                        provider.priority(),
                        is_critical
                    );
                }
                Err(e) if is_critical => {
                    return Err(e).with_context(|| {
                        format!("Critical service '{}' failed to start", provider.name())
                    });
                }
                Err(e) => {
                    warn!(
                        "Non-critical service '{}' failed to start: {}",
                        provider.name(),
                        e
                    );
                }
            }
        }

        info!("All critical services started successfully");
        Ok(())
    }

    /// Waits for Ctrl+C or SIGTERM, then shuts everything down.
    pub async fn run_main_loop(&mut self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs until `stop` resolves, then shuts everything down.
    pub async fn run_until<F>(&mut self, stop: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        info!("Starting main loop");
        let result = stop.await;

        if let Err(e) = &result {
            error!("Shutdown signal listener failed: {e:#}");
        }

        self.shutdown().await;
        info!("Main loop terminated");
        result
    }

    async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.task_manager.shutdown_all().await {
            error!("Error during task shutdown: {e:#}");
        }

        info!("Shutdown complete");
    }

    pub fn context(&self) -> Option<&Arc<LightingContext>> {
        self.context.as_ref()
    }

    pub fn running_services(&self) -> Vec<&'static str> {
        self.service_providers.iter().map(|p| p.name()).collect()
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.task_manager
    }
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")?;
        info!("Received Ctrl+C, initiating graceful shutdown...");
        Ok(())
    }
}
