//! Shared lighting state handed to every zone service.

use std::sync::{
    Arc,
    atomic::{AtomicU8, AtomicU32, Ordering},
};

use log::debug;
use tokio::sync::Mutex;

use crate::{
    adapter::AdapterSet,
    animation::AnimationMode,
    config::Settings,
    driver::Manufacturer,
    error::LedResult,
    gate::DeviceAccessGate,
    temperature::{Rgb, TemperatureSample},
};

/// Driver index whose temperature drives temperature mode.
pub const TEMPERATURE_SOURCE_INDEX: u32 = 0;

/// Process-wide lighting context.
///
/// Synchronization per field:
/// - `adapters`, `manufacturer`, `temperature_limits`: immutable after
///   construction, read freely.
/// - `mode`, `active_color`: atomic cells, read without locking by all
///   zones; `active_color` is only written inside the temperature section.
/// - `last_sample`: the temperature section itself, a true async lock
///   covering driver query, delta computation and color update.
/// - `gate`: owns the hardware channel lock.
#[derive(Debug)]
pub struct LightingContext {
    /// Backend that won detection
    pub manufacturer: Manufacturer,
    /// Adapters selected for control
    pub adapters: AdapterSet,
    /// Serialized access to the driver
    pub gate: DeviceAccessGate,
    temperature_limits: (i32, i32),
    mode: AtomicU8,
    active_color: AtomicU32,
    last_sample: Mutex<Option<TemperatureSample>>,
}

impl LightingContext {
    pub fn new(
        snapshot: &Settings,
        manufacturer: Manufacturer,
        adapters: AdapterSet,
        gate: DeviceAccessGate,
    ) -> Self {
        Self {
            manufacturer,
            adapters,
            gate,
            temperature_limits: snapshot.temperature_limits(),
            mode: AtomicU8::new(snapshot.animation_type.index()),
            active_color: AtomicU32::new(snapshot.color().packed()),
            last_sample: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> AnimationMode {
        AnimationMode::from_index(self.mode.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set_mode(&self, mode: AnimationMode) {
        self.mode.store(mode.index(), Ordering::Release);
    }

    pub fn active_color(&self) -> Rgb {
        Rgb::from_packed(self.active_color.load(Ordering::Acquire))
    }

    pub fn set_active_color(&self, color: Rgb) {
        self.active_color.store(color.packed(), Ordering::Release);
    }

    pub fn temperature_limits(&self) -> (i32, i32) {
        self.temperature_limits
    }

    /// Reads the source adapter temperature and updates the active color.
    ///
    /// Serialized across zones; on failure the active color is left as is.
    pub async fn sample_temperature(&self) -> LedResult<TemperatureSample> {
        let mut last = self.last_sample.lock().await;

        let celsius = self.gate.read_temperature(TEMPERATURE_SOURCE_INDEX).await?;
        let (lower, upper) = self.temperature_limits;
        let sample = TemperatureSample::from_reading(lower, upper, celsius);

        self.set_active_color(sample.color);
        if last.is_none_or(|prev| prev.delta != sample.delta) {
            debug!(
                "GPU at {}°C, delta {} -> {}",
                sample.celsius, sample.delta, sample.color
            );
        }
        *last = Some(sample);

        Ok(sample)
    }

    pub async fn last_sample(&self) -> Option<TemperatureSample> {
        *self.last_sample.lock().await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        adapter::{AdapterFilter, AdapterSet},
        driver::fake::FakeDriver,
        gate::Pacing,
    };

    pub fn fast_pacing() -> Pacing {
        Pacing {
            before_command: Duration::from_millis(1),
            settle: Duration::from_millis(1),
            sweep: Duration::from_millis(5),
        }
    }

    pub fn context_for(driver: Arc<FakeDriver>, settings: Settings) -> Arc<LightingContext> {
        let filter = AdapterFilter::new(driver.manufacturer, settings.overwrite_security_checks);
        let adapters = AdapterSet::enumerate(driver.as_ref(), &filter).unwrap();
        let settings = settings.clamped();
        Arc::new(LightingContext::new(
            &settings,
            driver.manufacturer,
            adapters,
            DeviceAccessGate::new(driver, fast_pacing()),
        ))
    }
}
