//! Graphics driver abstraction.

use std::fmt;

use crate::{
    animation::IlluminationCommand,
    error::LedResult,
    temperature::Rgb,
};

/// GPU manufacturer served by a driver backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manufacturer {
    Nvidia,
    Amd,
}

impl Manufacturer {
    /// PCI vendor code, upper-case hex.
    pub const fn vendor_code(self) -> &'static str {
        match self {
            Manufacturer::Nvidia => "10DE",
            Manufacturer::Amd => "1002",
        }
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Manufacturer::Nvidia => write!(f, "NVIDIA"),
            Manufacturer::Amd => write!(f, "AMD"),
        }
    }
}

/// Raw identity information reported by a backend for one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterIdentity {
    /// Packed hex ids, e.g. device id `1B8010DE` and subsystem id `33601462`.
    Packed {
        device_id: String,
        subsystem_id: String,
    },
    /// PnP instance path, e.g. `PCI\VEN_1002&DEV_67DF&SUBSYS_34111462&REV_CF\4&25438C51&0&0008`.
    Pnp(String),
}

/// Trait for vendor graphics driver backends.
///
/// Calls are blocking and go straight to the hardware; callers are expected
/// to run them off the async executor and to serialize them through
/// [`DeviceAccessGate`](crate::gate::DeviceAccessGate).
///
/// # Example
///
/// ```no_run
/// use shroud_ledd::animation::IlluminationCommand;
/// use shroud_ledd::driver::{AdapterIdentity, GraphicsDriver, Manufacturer};
/// use shroud_ledd::error::LedResult;
/// use shroud_ledd::temperature::Rgb;
///
/// #[derive(Debug)]
/// struct Dummy;
///
/// impl GraphicsDriver for Dummy {
///     fn manufacturer(&self) -> Manufacturer { Manufacturer::Nvidia }
///     fn initialize(&self) -> bool { true }
///     fn adapter_count(&self) -> LedResult<u32> { Ok(0) }
///     fn adapter_identity(&self, _index: u32) -> LedResult<AdapterIdentity> {
///         Ok(AdapterIdentity::Pnp(String::new()))
///     }
///     fn current_temperature(&self, _index: u32) -> LedResult<i32> { Ok(40) }
///     fn set_illumination(&self, _index: u32, _command: &IlluminationCommand, _color: Rgb) -> LedResult<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait GraphicsDriver: Send + Sync + fmt::Debug {
    fn manufacturer(&self) -> Manufacturer;

    /// Initializes the vendor library. `false` means the backend is unusable.
    fn initialize(&self) -> bool;

    fn adapter_count(&self) -> LedResult<u32>;

    fn adapter_identity(&self, index: u32) -> LedResult<AdapterIdentity>;

    /// Current core temperature in degrees Celsius.
    fn current_temperature(&self, index: u32) -> LedResult<i32>;

    /// Issues one illumination call with the full parameter list.
    fn set_illumination(
        &self,
        index: u32,
        command: &IlluminationCommand,
        color: Rgb,
    ) -> LedResult<()>;
}
