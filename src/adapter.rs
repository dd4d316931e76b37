//! Adapter discovery and eligibility filtering.
//!
//! Only cards from the board partner with a known shroud layout are
//! controlled unless the user explicitly overrides the checks.

use std::{ops::Deref, sync::Arc};

use log::{debug, info};

use crate::{
    driver::{AdapterIdentity, GraphicsDriver, Manufacturer},
    error::LedResult,
};

/// PCI sub-vendor code of the board partner whose shrouds are supported.
pub const BOARD_PARTNER_CODE: &str = "1462";

/// Device codes of cards with a known illumination layout.
pub const SUPPORTED_DEVICE_CODES: &[&str] = &[
    "1B06", // GTX 1080 Ti
    "1B80", // GTX 1080
    "1B81", // GTX 1070
    "1B82", // GTX 1070 Ti
    "1C02", // GTX 1060 3GB
    "1C03", // GTX 1060 6GB
    "67DF", // RX 470/480/570/580
    "687F", // RX Vega
];

/// A discovered graphics card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    /// Zero-based index assigned by the active backend.
    pub index: u32,
    pub vendor_code: String,
    pub device_code: String,
    pub sub_vendor_code: String,
}

impl Adapter {
    /// Extracts the identity codes from a backend blob.
    ///
    /// Returns `None` when the blob is too short or malformed; such adapters
    /// are excluded rather than treated as an error.
    ///
    /// # Example
    ///
    /// ```
    /// use shroud_ledd::adapter::Adapter;
    /// use shroud_ledd::driver::AdapterIdentity;
    ///
    /// let pnp = AdapterIdentity::Pnp(
    ///     r"PCI\VEN_1002&DEV_67DF&SUBSYS_34111462&REV_CF\4&25438C51&0&0008".to_string(),
    /// );
    /// let adapter = Adapter::from_identity(0, &pnp).unwrap();
    /// assert_eq!(adapter.vendor_code, "1002");
    /// assert_eq!(adapter.device_code, "67DF");
    /// assert_eq!(adapter.sub_vendor_code, "1462");
    /// ```
    pub fn from_identity(index: u32, identity: &AdapterIdentity) -> Option<Self> {
        let (vendor, device, sub_vendor) = match identity {
            AdapterIdentity::Packed {
                device_id,
                subsystem_id,
            } => (
                code_at(device_id, 4)?,
                code_at(device_id, 0)?,
                code_at(subsystem_id, 4)?,
            ),
            AdapterIdentity::Pnp(pnp) => {
                let ids = pnp.split('\\').nth(1)?;
                let parts: Vec<&str> = ids.split('&').collect();
                if parts.len() < 3 {
                    return None;
                }
                (
                    code_at(parts[0], 4)?,
                    code_at(parts[1], 4)?,
                    code_at(parts[2], 11)?,
                )
            }
        };

        Some(Self {
            index,
            vendor_code: vendor,
            device_code: device,
            sub_vendor_code: sub_vendor,
        })
    }
}

fn code_at(source: &str, start: usize) -> Option<String> {
    source
        .get(start..start + 4)
        .map(str::to_ascii_uppercase)
}

/// Eligibility rule for the active backend.
#[derive(Debug, Clone, Copy)]
pub struct AdapterFilter {
    pub manufacturer: Manufacturer,
    pub overwrite_security_checks: bool,
}

impl AdapterFilter {
    pub const fn new(manufacturer: Manufacturer, overwrite_security_checks: bool) -> Self {
        Self {
            manufacturer,
            overwrite_security_checks,
        }
    }

    pub fn includes(&self, adapter: &Adapter) -> bool {
        let vendor_matches = adapter
            .vendor_code
            .eq_ignore_ascii_case(self.manufacturer.vendor_code());

        if self.overwrite_security_checks {
            return vendor_matches;
        }

        vendor_matches
            && adapter.sub_vendor_code.eq_ignore_ascii_case(BOARD_PARTNER_CODE)
            && SUPPORTED_DEVICE_CODES
                .iter()
                .any(|code| adapter.device_code.eq_ignore_ascii_case(code))
    }
}

/// Adapters selected for control, in discovery order.
///
/// Built once at startup and shared read-only by every zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterSet(Arc<[Adapter]>);

impl AdapterSet {
    pub fn new(adapters: Vec<Adapter>) -> Self {
        Self(adapters.into())
    }

    /// Walks every adapter of `driver` and keeps those `filter` accepts.
    ///
    /// A failed identity query aborts the whole enumeration.
    pub fn enumerate(driver: &dyn GraphicsDriver, filter: &AdapterFilter) -> LedResult<Self> {
        let count = driver.adapter_count()?;
        let mut selected = Vec::new();

        for index in 0..count {
            let identity = driver.adapter_identity(index)?;

            let Some(adapter) = Adapter::from_identity(index, &identity) else {
                debug!("Skipping adapter {index}: unrecognized identity {identity:?}");
                continue;
            };

            if filter.includes(&adapter) {
                info!(
                    "Adapter {} selected (VEN_{} DEV_{} SUBVEN_{})",
                    adapter.index, adapter.vendor_code, adapter.device_code, adapter.sub_vendor_code
                );
                selected.push(adapter);
            } else {
                info!(
                    "Adapter {} not supported (VEN_{} DEV_{} SUBVEN_{})",
                    adapter.index, adapter.vendor_code, adapter.device_code, adapter.sub_vendor_code
                );
            }
        }

        Ok(Self::new(selected))
    }

    pub fn indices(&self) -> Vec<u32> {
        self.0.iter().map(|adapter| adapter.index).collect()
    }
}

impl Deref for AdapterSet {
    type Target = [Adapter];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
