//! Driver-level error taxonomy.
//!
//! Application glue (settings, coordinator, task manager) works with
//! `anyhow::Result`; everything that talks to a [`GraphicsDriver`] reports a
//! [`LedError`] so callers can decide what is fatal and what is skipped.
//!
//! [`GraphicsDriver`]: crate::driver::GraphicsDriver

use thiserror::Error;

use crate::driver::Manufacturer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedError {
    /// Backend init call returned false; detection falls through to the next backend.
    #[error("{0} driver failed to initialize")]
    DriverInit(Manufacturer),

    #[error("{0} driver could not report its adapter count")]
    AdapterCount(Manufacturer),

    /// Per-adapter info query failed; enumeration for the backend is aborted.
    #[error("{manufacturer} driver failed to describe adapter {index}")]
    Enumeration {
        manufacturer: Manufacturer,
        index: u32,
    },

    #[error("failed to read temperature of adapter {0}")]
    TemperatureRead(u32),

    #[error("illumination command {cmd} rejected by adapter {index}")]
    Illumination { index: u32, cmd: i32 },

    #[error("failed to load vendor library {path}: {reason}")]
    LibraryLoad { path: String, reason: String },

    #[error("vendor library is missing symbol {0}")]
    MissingSymbol(&'static str),
}

pub type LedResult<T> = Result<T, LedError>;
