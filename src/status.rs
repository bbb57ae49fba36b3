use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};

use crate::error::NvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NvStatus(i32);

impl NvStatus {
    pub const OK: Self = Self(0);
    pub const ERROR: Self = Self(-1);
    pub const LIBRARY_NOT_FOUND: Self = Self(-2);
    pub const NO_IMPLEMENTATION: Self = Self(-3);
    pub const API_NOT_INITIALIZED: Self = Self(-4);
    pub const INVALID_ARGUMENT: Self = Self(-5);
    pub const NVIDIA_DEVICE_NOT_FOUND: Self = Self(-6);
    pub const END_ENUMERATION: Self = Self(-7);
    pub const INVALID_HANDLE: Self = Self(-8);
    pub const INCOMPATIBLE_STRUCT_VERSION: Self = Self(-9);
    pub const HANDLE_INVALIDATED: Self = Self(-10);
    pub const EXPECTED_LOGICAL_GPU_HANDLE: Self = Self(-100);
    pub const EXPECTED_PHYSICAL_GPU_HANDLE: Self = Self(-101);
    pub const EXPECTED_DISPLAY_HANDLE: Self = Self(-102);
    pub const INVALID_COMBINATION: Self = Self(-103);
    pub const NOT_SUPPORTED: Self = Self(-104);
    pub const DEVICE_BUSY: Self = Self(-108);
    pub const INSUFFICIENT_BUFFER: Self = Self(-130);
    pub const ACCESS_DENIED: Self = Self(-131);
    pub const SYNC_NOT_ACTIVE: Self = Self(-150);
    pub const SYNC_MASTER_NOT_FOUND: Self = Self(-151);
    pub const INVALID_SYNC_TOPOLOGY: Self = Self(-152);

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }

    pub fn name(self) -> Option<&'static str> {
        STATUS_TABLE.get(&self.0).map(|info| info.name)
    }

    pub fn info(self) -> Option<&'static StatusInfo> {
        STATUS_TABLE.get(&self.0)
    }
}

impl fmt::Display for NvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for NvStatus {
    type Err = NvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(raw) = trimmed.parse::<i32>() {
            return Ok(Self(raw));
        }
        let upper = trimmed.to_uppercase().replace('-', "_");
        let name = if upper.starts_with("NVAPI_") {
            upper
        } else {
            format!("NVAPI_{}", upper)
        };
        STATUS_TABLE
            .values()
            .find(|info| info.name == name)
            .map(|info| Self(info.code))
            .ok_or_else(|| NvError::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub code: i32,
    pub name: &'static str,
    pub description: &'static str,
}

static STATUS_TABLE: Lazy<HashMap<i32, StatusInfo>> = Lazy::new(|| {
    let entries = [
        (NvStatus::OK, "NVAPI_OK", "Success. Request is completed."),
        (NvStatus::ERROR, "NVAPI_ERROR", "Generic error."),
        (
            NvStatus::LIBRARY_NOT_FOUND,
            "NVAPI_LIBRARY_NOT_FOUND",
            "NVAPI support library cannot be loaded.",
        ),
        (
            NvStatus::NO_IMPLEMENTATION,
            "NVAPI_NO_IMPLEMENTATION",
            "Not implemented in current driver installation.",
        ),
        (
            NvStatus::API_NOT_INITIALIZED,
            "NVAPI_API_NOT_INITIALIZED",
            "NvAPI_Initialize has not been called (successfully).",
        ),
        (
            NvStatus::INVALID_ARGUMENT,
            "NVAPI_INVALID_ARGUMENT",
            "The argument/parameter value is not valid or NULL.",
        ),
        (
            NvStatus::NVIDIA_DEVICE_NOT_FOUND,
            "NVAPI_NVIDIA_DEVICE_NOT_FOUND",
            "No NVIDIA display driver, or NVIDIA GPU driving a display, was found.",
        ),
        (
            NvStatus::END_ENUMERATION,
            "NVAPI_END_ENUMERATION",
            "No more items to enumerate.",
        ),
        (
            NvStatus::INVALID_HANDLE,
            "NVAPI_INVALID_HANDLE",
            "Invalid handle.",
        ),
        (
            NvStatus::INCOMPATIBLE_STRUCT_VERSION,
            "NVAPI_INCOMPATIBLE_STRUCT_VERSION",
            "An argument's structure version is not supported.",
        ),
        (
            NvStatus::HANDLE_INVALIDATED,
            "NVAPI_HANDLE_INVALIDATED",
            "The handle is no longer valid (likely due to GPU or display re-configuration).",
        ),
        (
            NvStatus::EXPECTED_LOGICAL_GPU_HANDLE,
            "NVAPI_EXPECTED_LOGICAL_GPU_HANDLE",
            "Expected a logical GPU handle for one or more parameters.",
        ),
        (
            NvStatus::EXPECTED_PHYSICAL_GPU_HANDLE,
            "NVAPI_EXPECTED_PHYSICAL_GPU_HANDLE",
            "Expected a physical GPU handle for one or more parameters.",
        ),
        (
            NvStatus::EXPECTED_DISPLAY_HANDLE,
            "NVAPI_EXPECTED_DISPLAY_HANDLE",
            "Expected an NV display handle for one or more parameters.",
        ),
        (
            NvStatus::INVALID_COMBINATION,
            "NVAPI_INVALID_COMBINATION",
            "The combination of parameters is not valid.",
        ),
        (
            NvStatus::NOT_SUPPORTED,
            "NVAPI_NOT_SUPPORTED",
            "Requested feature is not supported in the selected GPU.",
        ),
        (
            NvStatus::DEVICE_BUSY,
            "NVAPI_DEVICE_BUSY",
            "The device is busy; request not fulfilled.",
        ),
        (
            NvStatus::INSUFFICIENT_BUFFER,
            "NVAPI_INSUFFICIENT_BUFFER",
            "Buffer is too small to hold the requested data.",
        ),
        (
            NvStatus::ACCESS_DENIED,
            "NVAPI_ACCESS_DENIED",
            "No access to the caller.",
        ),
        (
            NvStatus::SYNC_NOT_ACTIVE,
            "NVAPI_SYNC_NOT_ACTIVE",
            "The requested action cannot be performed without Sync being enabled.",
        ),
        (
            NvStatus::SYNC_MASTER_NOT_FOUND,
            "NVAPI_SYNC_MASTER_NOT_FOUND",
            "The requested action cannot be performed without Sync Master being enabled.",
        ),
        (
            NvStatus::INVALID_SYNC_TOPOLOGY,
            "NVAPI_INVALID_SYNC_TOPOLOGY",
            "Invalid displays passed in the NV_GSYNC_DISPLAY pointer.",
        ),
    ];

    entries
        .into_iter()
        .map(|(status, name, description)| {
            (
                status.raw(),
                StatusInfo {
                    code: status.raw(),
                    name,
                    description,
                },
            )
        })
        .collect()
});

// OK first, then descending.
pub fn known_statuses() -> Vec<&'static StatusInfo> {
    let mut list: Vec<_> = STATUS_TABLE.values().collect();
    list.sort_by(|a, b| b.code.cmp(&a.code));
    list
}
