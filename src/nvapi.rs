use std::{
    ffi::{CStr, c_char, c_void},
    fmt,
    path::{Path, PathBuf},
};

use libloading::Library;
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::{
    config::NvApiConfig,
    error::NvError,
    session::{SessionSource, VendorSession},
    status::NvStatus,
};

const SHORT_STRING_LEN: usize = 64;

// nvapi_QueryInterface ids
mod interface {
    pub const INITIALIZE: u32 = 0x0150_E828;
    pub const UNLOAD: u32 = 0xD22B_DD7E;
    pub const GET_ERROR_MESSAGE: u32 = 0x6C2D_048C;
    pub const GET_INTERFACE_VERSION_STRING: u32 = 0x0105_3FA5;
    pub const SYS_GET_DRIVER_AND_BRANCH_VERSION: u32 = 0x2926_AAAD;
}

type ShortString = [c_char; SHORT_STRING_LEN];

type QueryInterfaceFn = unsafe extern "C" fn(u32) -> *mut c_void;
type InitializeFn = unsafe extern "C" fn() -> i32;
type UnloadFn = unsafe extern "C" fn() -> i32;
type GetErrorMessageFn = unsafe extern "C" fn(i32, *mut c_char) -> i32;
type GetInterfaceVersionStringFn = unsafe extern "C" fn(*mut c_char) -> i32;
type GetDriverAndBranchVersionFn = unsafe extern "C" fn(*mut u32, *mut c_char) -> i32;

static LIBRARY: OnceCell<NvApiLibrary> = OnceCell::new();

struct NvApiLibrary {
    path: PathBuf,
    query_interface: QueryInterfaceFn,
    _library: Library,
}

impl NvApiLibrary {
    fn get(path: &Path) -> Result<&'static Self, NvError> {
        let library = LIBRARY.get_or_try_init(|| Self::load(path))?;
        if library.path != path {
            tracing::debug!(
                "NvAPI already loaded from {}, ignoring {}",
                library.path.display(),
                path.display()
            );
        }
        Ok(library)
    }

    fn load(path: &Path) -> Result<Self, NvError> {
        tracing::info!("Loading NvAPI from {}", path.display());

        let library = unsafe { Library::new(path) }.map_err(|source| NvError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let query_interface = unsafe {
            let symbol = library
                .get::<QueryInterfaceFn>(b"nvapi_QueryInterface\0")
                .map_err(|source| NvError::LibraryLoad {
                    path: path.to_path_buf(),
                    source,
                })?;
            *symbol
        };

        Ok(Self {
            path: path.to_path_buf(),
            query_interface,
            _library: library,
        })
    }

    fn resolve(&self, id: u32, name: &'static str) -> Result<*mut c_void, NvError> {
        let ptr = unsafe { (self.query_interface)(id) };
        if ptr.is_null() {
            return Err(NvError::MissingInterface { name, id });
        }
        Ok(ptr)
    }
}

pub struct NvApi {
    library: &'static NvApiLibrary,
    unload: Option<UnloadFn>,
}

impl NvApi {
    pub fn open(config: &NvApiConfig) -> Result<Self, NvError> {
        let library = NvApiLibrary::get(&config.library_path)?;

        let initialize = library.resolve(interface::INITIALIZE, "NvAPI_Initialize")?;
        let initialize = unsafe { std::mem::transmute::<*mut c_void, InitializeFn>(initialize) };
        let status = NvStatus::from_raw(unsafe { initialize() });
        if !status.is_ok() {
            return Err(NvError::Initialize(status));
        }

        let unload = match library.resolve(interface::UNLOAD, "NvAPI_Unload") {
            Ok(ptr) => Some(unsafe { std::mem::transmute::<*mut c_void, UnloadFn>(ptr) }),
            Err(err) => {
                tracing::warn!("{}; session will not be unloaded", err);
                None
            }
        };

        tracing::debug!("NvAPI session opened");
        Ok(Self { library, unload })
    }

    pub fn interface_version(&self) -> Result<String, NvError> {
        let ptr = self.library.resolve(
            interface::GET_INTERFACE_VERSION_STRING,
            "NvAPI_GetInterfaceVersionString",
        )?;
        let call = unsafe { std::mem::transmute::<*mut c_void, GetInterfaceVersionStringFn>(ptr) };

        let mut buffer: ShortString = [0; SHORT_STRING_LEN];
        let status = NvStatus::from_raw(unsafe { call(buffer.as_mut_ptr()) });
        if !status.is_ok() {
            return Err(NvError::Query {
                call: "NvAPI_GetInterfaceVersionString",
                status,
            });
        }
        Ok(short_string(&buffer))
    }

    pub fn driver_version(&self) -> Result<DriverVersion, NvError> {
        let ptr = self.library.resolve(
            interface::SYS_GET_DRIVER_AND_BRANCH_VERSION,
            "NvAPI_SYS_GetDriverAndBranchVersion",
        )?;
        let call = unsafe { std::mem::transmute::<*mut c_void, GetDriverAndBranchVersionFn>(ptr) };

        let mut version = 0u32;
        let mut branch: ShortString = [0; SHORT_STRING_LEN];
        let status = NvStatus::from_raw(unsafe { call(&mut version, branch.as_mut_ptr()) });
        if !status.is_ok() {
            return Err(NvError::Query {
                call: "NvAPI_SYS_GetDriverAndBranchVersion",
                status,
            });
        }
        Ok(DriverVersion {
            version,
            branch: short_string(&branch),
        })
    }
}

impl VendorSession for NvApi {
    fn describe(&self, status: NvStatus) -> Result<String, NvError> {
        let ptr = self
            .library
            .resolve(interface::GET_ERROR_MESSAGE, "NvAPI_GetErrorMessage")?;
        let call = unsafe { std::mem::transmute::<*mut c_void, GetErrorMessageFn>(ptr) };

        let mut buffer: ShortString = [0; SHORT_STRING_LEN];
        let returned = NvStatus::from_raw(unsafe { call(status.raw(), buffer.as_mut_ptr()) });
        if !returned.is_ok() {
            return Err(NvError::Lookup { status, returned });
        }
        let text = short_string(&buffer);
        tracing::debug!("described {} as {:?}", status, text);
        Ok(text)
    }
}

impl Drop for NvApi {
    fn drop(&mut self) {
        let Some(unload) = self.unload else {
            return;
        };
        let status = NvStatus::from_raw(unsafe { unload() });
        if status.is_ok() {
            tracing::debug!("NvAPI session closed");
        } else {
            tracing::warn!("NvAPI_Unload returned {}", status);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NvApiSource {
    config: NvApiConfig,
}

impl NvApiSource {
    pub fn new(config: NvApiConfig) -> Self {
        Self { config }
    }
}

impl SessionSource for NvApiSource {
    type Session = NvApi;

    fn open(&self) -> Result<NvApi, NvError> {
        NvApi::open(&self.config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverVersion {
    pub version: u32,
    pub branch: String,
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.version / 100, self.version % 100)
    }
}

fn short_string(buffer: &ShortString) -> String {
    let bytes: Vec<u8> = buffer[..SHORT_STRING_LEN - 1]
        .iter()
        .map(|&c| c as u8)
        .chain(std::iter::once(0))
        .collect();
    CStr::from_bytes_until_nul(&bytes)
        .map(|text| text.to_string_lossy().into_owned())
        .unwrap_or_default()
}
