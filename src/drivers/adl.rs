//! AMD backend (`ADL` library).

use crate::driver::{AdapterIdentity, Manufacturer};

use super::native::{GraphicsInfo, NativeDriver, VendorAbi, wide_to_string};

const PNP_LENGTH: usize = 256;

/// Leading part of the adapter record written by `ADL_GetGraphicsInfo`.
#[repr(C)]
pub struct AdlGraphicsInfo {
    card_pnp: [u16; PNP_LENGTH],
    gpu_temperature_current: i32,
    reserved: [u8; 4096],
}

impl GraphicsInfo for AdlGraphicsInfo {
    fn zeroed() -> Self {
        Self {
            card_pnp: [0; PNP_LENGTH],
            gpu_temperature_current: 0,
            reserved: [0; 4096],
        }
    }

    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity::Pnp(wide_to_string(&self.card_pnp))
    }

    fn temperature(&self) -> i32 {
        self.gpu_temperature_current
    }
}

pub enum Adl {}

impl VendorAbi for Adl {
    const MANUFACTURER: Manufacturer = Manufacturer::Amd;
    const LIBRARY: &'static str = "ADL";
    const INITIALIZE: &'static str = "ADL_Initialize";
    const GPU_COUNTS: &'static str = "ADL_GetGPUCounts";
    const GRAPHICS_INFO: &'static str = "ADL_GetGraphicsInfo";
    const SET_ILLUMINATION: &'static str = "ADL_SetIlluminationParm_RGB";

    type Count = i32;
    type Info = AdlGraphicsInfo;
}

pub type AdlDriver = NativeDriver<Adl>;
