//! Application entry point and builder pattern implementation.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow};

use crate::{
    config::SettingsStore,
    coordinator::SystemCoordinator,
    driver::GraphicsDriver,
    drivers::native_backends,
    gate::Pacing,
    notify::{LogNotifier, Notifier},
};

/// Directory holding the vendor libraries, relative to the executable.
pub const LIBRARY_DIR_NAME: &str = "Lib";

/// Main application structure that orchestrates all daemon components.
///
/// # Example
///
/// ```no_run
/// use shroud_ledd::application::Application;
/// use shroud_ledd::config::SettingsStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let settings = SettingsStore::load_or_init(None).await?;
/// let mut app = Application::builder()
///     .with_settings_store(settings)
///     .build()?;
///
/// app.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Application {
    pub coordinator: SystemCoordinator,
    settings: SettingsStore,
    drivers: Vec<Arc<dyn GraphicsDriver>>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Runs the complete daemon lifecycle: initialize, start services, and run main loop.
    pub async fn run(&mut self) -> Result<()> {
        self.coordinator
            .initialize(self.settings.clone(), self.drivers.clone())
            .await?;

        self.coordinator.start_all_services().await?;

        self.coordinator.run_main_loop().await
    }
}

/// Builder for [`Application`].
///
/// Only the settings store is required. Backends default to the native
/// vendor libraries in [`LIBRARY_DIR_NAME`] next to the executable.
pub struct ApplicationBuilder {
    settings: Option<SettingsStore>,
    drivers: Option<Vec<Arc<dyn GraphicsDriver>>>,
    library_dir: Option<PathBuf>,
    notifier: Arc<dyn Notifier>,
    pacing: Pacing,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            settings: None,
            drivers: None,
            library_dir: None,
            notifier: Arc::new(LogNotifier),
            pacing: Pacing::default(),
        }
    }

    pub fn with_settings_store(mut self, settings: SettingsStore) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Replaces the native backends, in detection order.
    pub fn with_drivers(mut self, drivers: Vec<Arc<dyn GraphicsDriver>>) -> Self {
        self.drivers = Some(drivers);
        self
    }

    pub fn with_library_dir(mut self, library_dir: PathBuf) -> Self {
        self.library_dir = Some(library_dir);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn build(self) -> Result<Application> {
        let settings = self
            .settings
            .ok_or_else(|| anyhow!("Settings store is required"))?;

        let drivers = match self.drivers {
            Some(drivers) => drivers,
            None => {
                let library_dir = match self.library_dir {
                    Some(dir) => dir,
                    None => default_library_dir()?,
                };
                native_backends(&library_dir)
            }
        };

        Ok(Application {
            coordinator: SystemCoordinator::new(self.notifier, self.pacing),
            settings,
            drivers,
        })
    }
}

/// `Lib` directory next to the running executable.
pub fn default_library_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(dir.join(LIBRARY_DIR_NAME))
}
