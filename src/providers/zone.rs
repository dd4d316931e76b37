//! Per-zone lighting control services.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    animation::{AnimationMode, IlluminationCommand, Zone},
    app_context::LightingContext,
    gate::Cancelled,
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Control loop for one shroud zone.
///
/// Every iteration resolves the current animation mode, samples the GPU
/// temperature when the mode asks for it, and sweeps the resulting command
/// over all selected adapters. The loop runs until the task is cancelled;
/// hardware failures never stop it.
///
/// # Priority and Criticality
///
/// - **Priority**: 10
/// - **Critical**: Yes
pub struct ZoneServiceProvider {
    zone: Zone,
    context: Arc<LightingContext>,
}

impl ZoneServiceProvider {
    pub fn new(zone: Zone, context: Arc<LightingContext>) -> Self {
        Self { zone, context }
    }

    /// One service per zone, in front/side/back order.
    pub fn for_all_zones(context: &Arc<LightingContext>) -> Vec<Self> {
        Zone::ALL
            .into_iter()
            .map(|zone| Self::new(zone, context.clone()))
            .collect()
    }
}

#[async_trait]
impl ServiceProvider for ZoneServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let zone = self.zone;
        let context = self.context.clone();

        task_manager
            .spawn_task(self.name().to_string(), move |cancel_token| async move {
                run_zone_service(zone, context, cancel_token).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        match self.zone {
            Zone::Front => "FrontZoneService",
            Zone::Side => "SideZoneService",
            Zone::Back => "BackZoneService",
        }
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_critical(&self) -> bool {
        true
    }
}

async fn run_zone_service(
    zone: Zone,
    context: Arc<LightingContext>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!(
        "{zone} zone driving {} adapter(s) on {}",
        context.adapters.len(),
        context.manufacturer
    );

    while update_zone(zone, &context, &cancel_token).await.is_ok() {}

    info!("{zone} zone service cancelled");
    Ok(())
}

async fn update_zone(
    zone: Zone,
    context: &LightingContext,
    cancel_token: &CancellationToken,
) -> Result<(), Cancelled> {
    let mode = context.mode();

    let color = if mode == AnimationMode::TemperatureBased {
        match context.sample_temperature().await {
            Ok(sample) => sample.color,
            Err(e) => {
                debug!("{zone} zone skipping update: {e}");
                return context.gate.idle(cancel_token).await;
            }
        }
    } else {
        context.active_color()
    };

    let command = IlluminationCommand::for_mode(mode, zone);
    context
        .gate
        .sweep(&context.adapters, command, color, cancel_token)
        .await
        .map(|_| ())
}
