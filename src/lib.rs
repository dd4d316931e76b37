//! # shroud_ledd
//!
//! A daemon that drives the shroud LEDs of MSI graphics cards through the
//! vendor illumination libraries.
//!
//! ## Features
//!
//! - **Async Architecture**: one Tokio task per shroud zone
//! - **Animations**: static color, breathing, flashing, double flashing, off
//! - **Temperature Mode**: green-to-red color tracking the GPU temperature
//! - **Safety Filter**: only supported MSI cards are driven unless overridden
//! - **Serialized Hardware Access**: one driver call in flight at a time
//!
//! ## Architecture
//!
//! - [`SystemCoordinator`](coordinator::SystemCoordinator) - lifecycle manager
//! - [`LightingContext`](app_context::LightingContext) - shared lighting state
//! - [`DeviceAccessGate`](gate::DeviceAccessGate) - hardware channel lock
//! - [`GraphicsDriver`](driver::GraphicsDriver) - vendor backend seam
//!
//! ## Example
//!
//! ```no_run
//! use shroud_ledd::{application::Application, config::SettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = SettingsStore::load_or_init(None).await?;
//!     Application::builder()
//!         .with_settings_store(settings)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod adapter;
pub mod animation;
pub mod app_context;
pub mod application;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod gate;
pub mod notify;
pub mod providers;
pub mod task_manager;
pub mod temperature;
