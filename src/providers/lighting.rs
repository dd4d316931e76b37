//! Lighting context provider for dependency injection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use crate::{
    app_context::LightingContext,
    config::SettingsStore,
    driver::GraphicsDriver,
    drivers::{ActiveBackend, detect_backends},
    gate::{DeviceAccessGate, Pacing},
    providers::traits::AsyncProvider,
};

/// Builds the shared [`LightingContext`] from the settings and the
/// candidate backends.
///
/// Detection talks to the vendor libraries and runs on the blocking pool.
/// Yields `None` when there is nothing to control: no backend reported an
/// adapter, or none of the adapters passed the filter.
pub struct LightingContextProvider {
    settings: SettingsStore,
    drivers: Vec<Arc<dyn GraphicsDriver>>,
    pacing: Pacing,
}

impl LightingContextProvider {
    pub fn new(settings: SettingsStore, drivers: Vec<Arc<dyn GraphicsDriver>>, pacing: Pacing) -> Self {
        Self {
            settings,
            drivers,
            pacing,
        }
    }
}

#[async_trait]
impl AsyncProvider<Option<Arc<LightingContext>>> for LightingContextProvider {
    async fn provide(&self) -> Result<Option<Arc<LightingContext>>> {
        let snapshot = self.settings.clone_settings().await;
        let drivers = self.drivers.clone();
        let overwrite = snapshot.overwrite_security_checks;

        if overwrite {
            warn!("Security checks disabled: every adapter of the active vendor will be driven");
        }

        let detected = tokio::task::spawn_blocking(move || detect_backends(&drivers, overwrite))
            .await
            .context("Backend detection task panicked")?
            .context("Failed to enumerate graphics adapters")?;

        let Some(ActiveBackend { driver, adapters }) = detected else {
            info!("No graphics backend reported any adapter");
            return Ok(None);
        };

        if adapters.is_empty() {
            return Ok(None);
        }

        info!(
            "Driving {} {} adapter(s) in {} mode",
            adapters.len(),
            driver.manufacturer(),
            snapshot.animation_type
        );

        let manufacturer = driver.manufacturer();
        let gate = DeviceAccessGate::new(driver, self.pacing);
        Ok(Some(Arc::new(LightingContext::new(
            &snapshot,
            manufacturer,
            adapters,
            gate,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::AnimationMode,
        app_context::test_support::fast_pacing,
        config::Settings,
        driver::{AdapterIdentity, Manufacturer, fake::FakeDriver},
        error::LedError,
        temperature::Rgb,
    };
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn store(settings: Settings) -> SettingsStore {
        SettingsStore::new(settings, PathBuf::from("/tmp/shroud_ledd-provider.json"))
    }

    #[tokio::test]
    async fn builds_context_for_selected_adapters() {
        let settings = Settings {
            r: 1,
            g: 2,
            b: 3,
            animation_type: AnimationMode::Flashing,
            temperature_lower_limit: 90,
            temperature_upper_limit: 20,
            ..Settings::default()
        };
        let driver = Arc::new(FakeDriver::new(
            Manufacturer::Nvidia,
            vec![FakeDriver::msi_nvidia("2204"), FakeDriver::msi_nvidia("1C02")],
        ));
        let provider = LightingContextProvider::new(store(settings), vec![driver], fast_pacing());

        let context = provider.provide().await.unwrap().unwrap();

        assert_eq!(context.manufacturer, Manufacturer::Nvidia);
        assert_eq!(context.adapters.indices(), vec![1]);
        assert_eq!(context.mode(), AnimationMode::Flashing);
        assert_eq!(context.active_color(), Rgb::new(1, 2, 3));
        assert_eq!(context.temperature_limits(), (90, 91));
    }

    #[tokio::test]
    async fn override_selects_any_card_of_the_vendor() {
        let settings = Settings {
            overwrite_security_checks: true,
            ..Settings::default()
        };
        let driver = Arc::new(FakeDriver::new(
            Manufacturer::Nvidia,
            vec![AdapterIdentity::Packed {
                device_id: "220410DE".to_string(),
                subsystem_id: "38811043".to_string(),
            }],
        ));
        let provider = LightingContextProvider::new(store(settings), vec![driver], fast_pacing());

        let context = provider.provide().await.unwrap().unwrap();
        assert_eq!(context.adapters.indices(), vec![0]);
    }

    #[tokio::test]
    async fn nothing_to_control_yields_none() {
        let driver = Arc::new(FakeDriver::new(
            Manufacturer::Nvidia,
            vec![FakeDriver::msi_nvidia("2204")],
        ));
        let provider =
            LightingContextProvider::new(store(Settings::default()), vec![driver], fast_pacing());

        assert!(provider.provide().await.unwrap().is_none());

        let empty = LightingContextProvider::new(store(Settings::default()), vec![], fast_pacing());
        assert!(empty.provide().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn count_failure_is_an_error() {
        let mut broken = FakeDriver::new(Manufacturer::Amd, vec![]);
        broken.count = None;
        let provider = LightingContextProvider::new(
            store(Settings::default()),
            vec![Arc::new(broken)],
            fast_pacing(),
        );

        let err = provider.provide().await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedError>(),
            Some(&LedError::AdapterCount(Manufacturer::Amd))
        );
    }
}
