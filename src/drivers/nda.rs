//! Nvidia backend (`NDA` library).

use crate::driver::{AdapterIdentity, Manufacturer};

use super::native::{GraphicsInfo, NativeDriver, VendorAbi, wide_to_string};

/// Length, in UTF-16 units, of the id strings in [`NdaGraphicsInfo`].
const ID_LENGTH: usize = 128;

/// Leading part of the adapter record written by `NDA_GetGraphicsInfo`.
///
/// Only the fields read here are spelled out; the reserved tail gives the
/// library room for the rest of its record.
#[repr(C)]
pub struct NdaGraphicsInfo {
    card_device_id: [u16; ID_LENGTH],
    card_subsystem_id: [u16; ID_LENGTH],
    gpu_temperature_current: i32,
    reserved: [u8; 4096],
}

impl GraphicsInfo for NdaGraphicsInfo {
    fn zeroed() -> Self {
        Self {
            card_device_id: [0; ID_LENGTH],
            card_subsystem_id: [0; ID_LENGTH],
            gpu_temperature_current: 0,
            reserved: [0; 4096],
        }
    }

    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity::Packed {
            device_id: wide_to_string(&self.card_device_id),
            subsystem_id: wide_to_string(&self.card_subsystem_id),
        }
    }

    fn temperature(&self) -> i32 {
        self.gpu_temperature_current
    }
}

pub enum Nda {}

impl VendorAbi for Nda {
    const MANUFACTURER: Manufacturer = Manufacturer::Nvidia;
    const LIBRARY: &'static str = "NDA";
    const INITIALIZE: &'static str = "NDA_Initialize";
    const GPU_COUNTS: &'static str = "NDA_GetGPUCounts";
    const GRAPHICS_INFO: &'static str = "NDA_GetGraphicsInfo";
    const SET_ILLUMINATION: &'static str = "NDA_SetIlluminationParmColor_RGB";

    type Count = i64;
    type Info = NdaGraphicsInfo;
}

pub type NdaDriver = NativeDriver<Nda>;
