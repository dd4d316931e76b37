//! Vendor backends and backend selection.

pub mod adl;
pub mod native;
pub mod nda;

use std::{path::Path, sync::Arc};

use log::{info, warn};

use crate::{
    adapter::{AdapterFilter, AdapterSet},
    driver::GraphicsDriver,
    error::{LedError, LedResult},
};

pub use adl::AdlDriver;
pub use nda::NdaDriver;

/// Native backends in detection order: Nvidia first, then AMD.
pub fn native_backends(library_dir: &Path) -> Vec<Arc<dyn GraphicsDriver>> {
    vec![
        Arc::new(NdaDriver::new(library_dir)),
        Arc::new(AdlDriver::new(library_dir)),
    ]
}

/// Backend that won detection, with the adapters it will control.
#[derive(Debug, Clone)]
pub struct ActiveBackend {
    pub driver: Arc<dyn GraphicsDriver>,
    pub adapters: AdapterSet,
}

/// Selects the first backend that initializes and reports at least one
/// adapter, then enumerates its adapters through the eligibility filter.
///
/// A backend that fails to initialize is skipped. A failed adapter count or
/// identity query is fatal. Returns `None` when no backend has any adapter;
/// a winning backend may still yield an empty [`AdapterSet`].
pub fn detect_backends(
    drivers: &[Arc<dyn GraphicsDriver>],
    overwrite_security_checks: bool,
) -> LedResult<Option<ActiveBackend>> {
    for driver in drivers {
        let manufacturer = driver.manufacturer();

        if !driver.initialize() {
            warn!("{}", LedError::DriverInit(manufacturer));
            continue;
        }

        let count = driver.adapter_count()?;
        info!("{manufacturer} driver reports {count} adapter(s)");
        if count == 0 {
            continue;
        }

        let filter = AdapterFilter::new(manufacturer, overwrite_security_checks);
        let adapters = AdapterSet::enumerate(driver.as_ref(), &filter)?;

        return Ok(Some(ActiveBackend {
            driver: driver.clone(),
            adapters,
        }));
    }

    Ok(None)
}
