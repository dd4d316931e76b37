//! Serialized access to the hardware command channel.
//!
//! All three zones share one driver channel. Each driver call is submitted
//! as a single blocking invocation while holding the channel lock, so
//! parameter lists of concurrent commands never interleave.

use std::{sync::Arc, time::Duration};

use log::{debug, error};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    adapter::AdapterSet,
    animation::IlluminationCommand,
    driver::GraphicsDriver,
    error::{LedError, LedResult},
    temperature::Rgb,
};

/// Returned when the shutdown token fires at a suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Delays around hardware calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Wait before competing for the channel.
    pub before_command: Duration,
    /// Wait after taking the channel, before the driver call.
    pub settle: Duration,
    /// Wait after a full adapter sweep; the zone loop cadence.
    pub sweep: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            before_command: Duration::from_millis(10),
            settle: Duration::from_millis(20),
            sweep: Duration::from_millis(2000),
        }
    }
}

/// Sleeps for `duration` unless `token` is cancelled first.
pub async fn pause(token: &CancellationToken, duration: Duration) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        return Err(Cancelled);
    }
    if duration.is_zero() {
        tokio::task::yield_now().await;
        return Ok(());
    }
    tokio::select! {
        () = token.cancelled() => Err(Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Gate in front of the active [`GraphicsDriver`].
#[derive(Debug, Clone)]
pub struct DeviceAccessGate {
    driver: Arc<dyn GraphicsDriver>,
    channel: Arc<Mutex<()>>,
    pacing: Pacing,
}

impl DeviceAccessGate {
    pub fn new(driver: Arc<dyn GraphicsDriver>, pacing: Pacing) -> Self {
        Self {
            driver,
            channel: Arc::new(Mutex::new(())),
            pacing,
        }
    }

    /// Sends `command` with `color` to every adapter in order, then waits the
    /// sweep delay.
    ///
    /// Driver failures are logged and skipped; the next sweep retries
    /// naturally. Returns the number of adapters that accepted the command.
    pub async fn sweep(
        &self,
        adapters: &AdapterSet,
        command: IlluminationCommand,
        color: Rgb,
        token: &CancellationToken,
    ) -> Result<usize, Cancelled> {
        let mut accepted = 0;

        for adapter in adapters.iter() {
            pause(token, self.pacing.before_command).await?;

            let guard = tokio::select! {
                () = token.cancelled() => return Err(Cancelled),
                guard = self.channel.lock() => guard,
            };
            pause(token, self.pacing.settle).await?;

            match self.submit(adapter.index, command, color).await {
                Ok(()) => {
                    accepted += 1;
                    debug!(
                        "Adapter {}: cmd {} group {} color {}",
                        adapter.index, command.cmd, command.led_group, color
                    );
                }
                Err(e) => error!("Illumination update failed: {e}"),
            }

            drop(guard);
        }

        self.idle(token).await?;
        Ok(accepted)
    }

    /// Reads the temperature of `index` through the channel.
    pub async fn read_temperature(&self, index: u32) -> LedResult<i32> {
        let _guard = self.channel.lock().await;
        let driver = self.driver.clone();

        tokio::task::spawn_blocking(move || driver.current_temperature(index))
            .await
            .unwrap_or(Err(LedError::TemperatureRead(index)))
    }

    /// Waits one loop cadence without touching the hardware.
    pub async fn idle(&self, token: &CancellationToken) -> Result<(), Cancelled> {
        pause(token, self.pacing.sweep).await
    }

    async fn submit(&self, index: u32, command: IlluminationCommand, color: Rgb) -> LedResult<()> {
        let driver = self.driver.clone();

        tokio::task::spawn_blocking(move || driver.set_illumination(index, &command, color))
            .await
            .unwrap_or(Err(LedError::Illumination {
                index,
                cmd: command.cmd,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::Adapter,
        animation::{AnimationMode, Zone},
        driver::{Manufacturer, fake::FakeDriver},
    };
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    fn fast_pacing() -> Pacing {
        Pacing {
            before_command: Duration::from_millis(1),
            settle: Duration::from_millis(1),
            sweep: Duration::from_millis(1),
        }
    }

    fn adapters(indices: &[u32]) -> AdapterSet {
        AdapterSet::new(
            indices
                .iter()
                .map(|&index| Adapter {
                    index,
                    vendor_code: "10DE".to_string(),
                    device_code: "1B80".to_string(),
                    sub_vendor_code: "1462".to_string(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn sweep_commands_every_adapter_in_order() {
        let driver = Arc::new(FakeDriver::new(Manufacturer::Nvidia, vec![]));
        let gate = DeviceAccessGate::new(driver.clone(), fast_pacing());
        let command = IlluminationCommand::for_mode(AnimationMode::Breathing, Zone::Side);
        let token = CancellationToken::new();

        let accepted = gate
            .sweep(&adapters(&[0, 2, 5]), command, Rgb::RED, &token)
            .await
            .unwrap();

        assert_eq!(accepted, 3);
        let calls = driver.calls();
        assert_eq!(
            calls.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 2, 5]
        );
        assert!(calls.iter().all(|c| c.command == command && c.color == Rgb::RED));
    }

    #[tokio::test]
    async fn failed_write_does_not_stop_sweep() {
        let mut fake = FakeDriver::new(Manufacturer::Nvidia, vec![]);
        fake.fail_indices.insert(1);
        let driver = Arc::new(fake);
        let gate = DeviceAccessGate::new(driver.clone(), fast_pacing());
        let command = IlluminationCommand::for_mode(AnimationMode::Flashing, Zone::Front);
        let token = CancellationToken::new();

        let accepted = gate
            .sweep(&adapters(&[0, 1, 2]), command, Rgb::RED, &token)
            .await;

        assert_eq!(accepted, Ok(2));
        assert_eq!(driver.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(
            driver.calls().iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sweeps_never_overlap() {
        let mut fake = FakeDriver::new(Manufacturer::Nvidia, vec![]);
        fake.call_delay = Duration::from_millis(3);
        let driver = Arc::new(fake);
        let gate = DeviceAccessGate::new(driver.clone(), Pacing {
            before_command: Duration::ZERO,
            settle: Duration::ZERO,
            sweep: Duration::ZERO,
        });
        let set = adapters(&[0, 1]);
        let token = CancellationToken::new();

        let handles: Vec<_> = Zone::ALL
            .into_iter()
            .map(|zone| {
                let gate = gate.clone();
                let set = set.clone();
                let token = token.clone();
                tokio::spawn(async move {
                    let command = IlluminationCommand::for_mode(AnimationMode::Flashing, zone);
                    for _ in 0..5 {
                        gate.sweep(&set, command, Rgb::new(1, 2, 3), &token)
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            handle.unwrap();
        }

        assert_eq!(driver.overlaps.load(Ordering::SeqCst), 0);
        assert_eq!(driver.calls().len(), 3 * 5 * 2);
    }

    #[tokio::test]
    async fn cancelled_sweep_stops_before_hardware() {
        let driver = Arc::new(FakeDriver::new(Manufacturer::Nvidia, vec![]));
        let gate = DeviceAccessGate::new(driver.clone(), fast_pacing());
        let token = CancellationToken::new();
        token.cancel();

        let result = gate
            .sweep(
                &adapters(&[0]),
                IlluminationCommand::for_mode(AnimationMode::NoAnimation, Zone::Front),
                Rgb::RED,
                &token,
            )
            .await;

        assert_eq!(result, Err(Cancelled));
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn read_temperature_reports_failure() {
        let driver = Arc::new(FakeDriver::new(Manufacturer::Amd, vec![]));
        let gate = DeviceAccessGate::new(driver.clone(), fast_pacing());

        assert_eq!(gate.read_temperature(0).await, Ok(65));
        driver.set_temperature(None);
        assert_eq!(
            gate.read_temperature(0).await,
            Err(LedError::TemperatureRead(0))
        );
    }

    #[tokio::test]
    async fn pause_returns_early_on_cancel() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move { child.cancel() });

        let started = std::time::Instant::now();
        assert_eq!(pause(&token, Duration::from_secs(30)).await, Err(Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn default_pacing_matches_protocol() {
        let pacing = Pacing::default();
        assert_eq!(pacing.before_command, Duration::from_millis(10));
        assert_eq!(pacing.settle, Duration::from_millis(20));
        assert_eq!(pacing.sweep, Duration::from_secs(2));
    }
}
