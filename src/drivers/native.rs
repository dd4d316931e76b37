//! Dynamically loaded vendor illumination libraries.
//!
//! Both vendor libraries expose the same four entry points with slightly
//! different record layouts. [`NativeDriver`] implements [`GraphicsDriver`]
//! once, parameterized by a [`VendorAbi`] describing one library.

use std::{
    fmt,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use libloading::Library;
use log::{info, warn};

use crate::{
    animation::IlluminationCommand,
    driver::{AdapterIdentity, GraphicsDriver, Manufacturer},
    error::{LedError, LedResult},
    temperature::Rgb,
};

/// Win32 `BOOL`, as returned by every vendor entry point.
pub type Bool32 = i32;

/// Adapter record filled in by the vendor's graphics-info call.
pub trait GraphicsInfo: Sized {
    /// Blank record handed to the library to fill.
    fn zeroed() -> Self;

    fn identity(&self) -> AdapterIdentity;

    fn temperature(&self) -> i32;
}

/// Names and record types of one vendor library.
pub trait VendorAbi: 'static {
    const MANUFACTURER: Manufacturer;
    /// Library stem, without platform prefix or extension.
    const LIBRARY: &'static str;
    const INITIALIZE: &'static str;
    const GPU_COUNTS: &'static str;
    const GRAPHICS_INFO: &'static str;
    const SET_ILLUMINATION: &'static str;

    /// Integer type written by the adapter-count call.
    type Count: Copy + Default + TryInto<u32>;
    type Info: GraphicsInfo;
}

type InitializeFn = unsafe extern "system" fn() -> Bool32;

type SetIlluminationFn = unsafe extern "system" fn(
    i32, // adapter index
    i32, // cmd
    i32, // led group
    i32, // secondary led group
    i32, // on time
    i32, // off time
    i32, // time
    i32, // dark time
    i32, // brightness
    i32, // r
    i32, // g
    i32, // b
    Bool32,
) -> Bool32;

struct VendorApi<A: VendorAbi> {
    initialize: InitializeFn,
    gpu_counts: unsafe extern "system" fn(*mut A::Count) -> Bool32,
    graphics_info: unsafe extern "system" fn(i32, *mut A::Info) -> Bool32,
    set_illumination: SetIlluminationFn,
    // Keeps the resolved function pointers valid.
    _library: Library,
}

impl<A: VendorAbi> VendorApi<A> {
    fn load(path: &Path) -> LedResult<Self> {
        // SAFETY: loading runs the library's initializers. The vendor
        // libraries only register their own state and are loaded once per
        // driver instance.
        let library = unsafe { Library::new(path) }.map_err(|e| LedError::LibraryLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // SAFETY: the declared pointer types mirror the exported prototypes;
        // the pointers are only used while `_library` is alive.
        unsafe {
            Ok(Self {
                initialize: symbol(&library, A::INITIALIZE)?,
                gpu_counts: symbol(&library, A::GPU_COUNTS)?,
                graphics_info: symbol(&library, A::GRAPHICS_INFO)?,
                set_illumination: symbol(&library, A::SET_ILLUMINATION)?,
                _library: library,
            })
        }
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> LedResult<T> {
    // SAFETY: forwarded to the caller, which names the matching type.
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|_| LedError::MissingSymbol(name))
}

/// Decodes a nul-terminated UTF-16 buffer.
pub fn wide_to_string(buffer: &[u16]) -> String {
    let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..end])
}

/// [`GraphicsDriver`] backed by a vendor library loaded at runtime.
///
/// The library is loaded by [`initialize`](GraphicsDriver::initialize); a
/// missing file or symbol makes initialization fail, which lets backend
/// detection move on to the next vendor.
pub struct NativeDriver<A: VendorAbi> {
    path: PathBuf,
    api: OnceLock<VendorApi<A>>,
    _abi: PhantomData<fn() -> A>,
}

impl<A: VendorAbi> NativeDriver<A> {
    /// Driver for the vendor library inside `library_dir`.
    pub fn new(library_dir: &Path) -> Self {
        Self {
            path: library_dir.join(libloading::library_filename(A::LIBRARY)),
            api: OnceLock::new(),
            _abi: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn api(&self) -> LedResult<&VendorApi<A>> {
        self.api.get().ok_or(LedError::DriverInit(A::MANUFACTURER))
    }

    fn graphics_info(&self, index: u32) -> Option<A::Info> {
        let api = self.api().ok()?;
        let index = i32::try_from(index).ok()?;
        let mut info = A::Info::zeroed();

        // SAFETY: `info` is a live, writable record of the layout the
        // library expects.
        let ok = unsafe { (api.graphics_info)(index, &mut info) };
        (ok != 0).then_some(info)
    }
}

impl<A: VendorAbi> fmt::Debug for NativeDriver<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeDriver")
            .field("manufacturer", &A::MANUFACTURER)
            .field("path", &self.path)
            .field("loaded", &self.api.get().is_some())
            .finish()
    }
}

impl<A: VendorAbi> GraphicsDriver for NativeDriver<A> {
    fn manufacturer(&self) -> Manufacturer {
        A::MANUFACTURER
    }

    fn initialize(&self) -> bool {
        if self.api.get().is_some() {
            return true;
        }

        let api = match VendorApi::<A>::load(&self.path) {
            Ok(api) => api,
            Err(e) => {
                warn!("{} backend unavailable: {e}", A::MANUFACTURER);
                return false;
            }
        };

        // SAFETY: no arguments; the library was loaded successfully.
        if unsafe { (api.initialize)() } == 0 {
            return false;
        }

        info!("{} backend loaded from {}", A::MANUFACTURER, self.path.display());
        let _ = self.api.set(api);
        true
    }

    fn adapter_count(&self) -> LedResult<u32> {
        let api = self.api()?;
        let mut count = A::Count::default();

        // SAFETY: `count` is a valid out-parameter of the declared width.
        if unsafe { (api.gpu_counts)(&mut count) } == 0 {
            return Err(LedError::AdapterCount(A::MANUFACTURER));
        }

        count
            .try_into()
            .map_err(|_| LedError::AdapterCount(A::MANUFACTURER))
    }

    fn adapter_identity(&self, index: u32) -> LedResult<AdapterIdentity> {
        self.graphics_info(index)
            .map(|info| info.identity())
            .ok_or(LedError::Enumeration {
                manufacturer: A::MANUFACTURER,
                index,
            })
    }

    fn current_temperature(&self, index: u32) -> LedResult<i32> {
        self.graphics_info(index)
            .map(|info| info.temperature())
            .ok_or(LedError::TemperatureRead(index))
    }

    fn set_illumination(
        &self,
        index: u32,
        command: &IlluminationCommand,
        color: Rgb,
    ) -> LedResult<()> {
        let rejected = LedError::Illumination {
            index,
            cmd: command.cmd,
        };
        let api = self.api()?;
        let adapter = i32::try_from(index).map_err(|_| rejected.clone())?;

        // SAFETY: plain integer arguments; callers serialize access to the
        // library through the device gate.
        let ok = unsafe {
            (api.set_illumination)(
                adapter,
                command.cmd,
                command.led_group,
                command.secondary_led_group,
                command.on_time,
                command.off_time,
                command.time,
                command.dark_time,
                command.brightness,
                i32::from(color.r),
                i32::from(color.g),
                i32::from(color.b),
                Bool32::from(command.single_call),
            )
        };

        if ok == 0 { Err(rejected) } else { Ok(()) }
    }
}
