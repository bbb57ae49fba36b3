use std::{env, path::PathBuf};

pub const LIBRARY_ENV: &str = "NVAPI_LIBRARY";

#[cfg(all(windows, target_pointer_width = "64"))]
pub const DEFAULT_LIBRARY: &str = "nvapi64.dll";
#[cfg(all(windows, not(target_pointer_width = "64")))]
pub const DEFAULT_LIBRARY: &str = "nvapi.dll";
#[cfg(not(windows))]
pub const DEFAULT_LIBRARY: &str = "libnvidia-api.so.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvApiConfig {
    pub library_path: PathBuf,
}

impl NvApiConfig {
    pub fn from_env() -> Self {
        Self::from_override(env::var_os(LIBRARY_ENV).map(PathBuf::from))
    }

    fn from_override(library: Option<PathBuf>) -> Self {
        match library {
            Some(path) if !path.as_os_str().is_empty() => Self { library_path: path },
            _ => Self::default(),
        }
    }

    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = path.into();
        self
    }
}

impl Default for NvApiConfig {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from(DEFAULT_LIBRARY),
        }
    }
}
