use std::path::PathBuf;

use thiserror::Error;

use crate::status::NvStatus;

#[derive(Debug, Error)]
pub enum NvError {
    #[error("{context} Error: {description}")]
    OperationFailed {
        status: NvStatus,
        context: String,
        description: String,
    },
    #[error("failed to load NvAPI library {}: {source}", .path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("NvAPI interface {name} (0x{id:08x}) is not available")]
    MissingInterface { name: &'static str, id: u32 },
    #[error("NvAPI_Initialize returned {0}")]
    Initialize(NvStatus),
    #[error("NvAPI_GetErrorMessage returned {returned} while describing {status}")]
    Lookup { status: NvStatus, returned: NvStatus },
    #[error("{call} returned {status}")]
    Query { call: &'static str, status: NvStatus },
    #[error("invalid NvAPI status: {0}")]
    InvalidStatus(String),
}

impl NvError {
    pub fn status(&self) -> Option<NvStatus> {
        match self {
            NvError::OperationFailed { status, .. } => Some(*status),
            NvError::Initialize(status) => Some(*status),
            NvError::Lookup { returned, .. } => Some(*returned),
            NvError::Query { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NvError;
    use crate::status::NvStatus;

    #[test]
    fn operation_failed_renders_composed_message() {
        let err = NvError::OperationFailed {
            status: NvStatus::NOT_SUPPORTED,
            context: "Query failed.".to_string(),
            description: "Feature not supported on this device.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Query failed. Error: Feature not supported on this device."
        );
        assert_eq!(err.status(), Some(NvStatus::NOT_SUPPORTED));
    }

    #[test]
    fn parse_errors_carry_no_status() {
        let err = NvError::InvalidStatus("bogus".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "invalid NvAPI status: bogus");
    }
}
