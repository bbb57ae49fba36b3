pub mod checker;
pub mod config;
pub mod error;
pub mod nvapi;
pub mod session;
pub mod status;

pub use checker::{StatusChecker, check};
pub use config::NvApiConfig;
pub use error::NvError;
pub use nvapi::{DriverVersion, NvApi, NvApiSource};
pub use session::{Offline, OfflineSession, SessionSource, VendorSession};
pub use status::{NvStatus, StatusInfo, known_statuses};
