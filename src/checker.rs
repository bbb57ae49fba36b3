use crate::{
    config::NvApiConfig,
    error::NvError,
    nvapi::NvApiSource,
    session::{SessionSource, VendorSession},
    status::NvStatus,
};

#[derive(Debug, Clone)]
pub struct StatusChecker<S> {
    source: S,
}

impl<S: SessionSource> StatusChecker<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    #[inline]
    pub fn check(&self, status: NvStatus, context: &str) -> Result<(), NvError> {
        if status.is_ok() {
            return Ok(());
        }
        self.failure(status, context)
    }

    #[cold]
    fn failure(&self, status: NvStatus, context: &str) -> Result<(), NvError> {
        let session = self.source.open()?;
        let description = session.describe(status)?;
        tracing::debug!("{} failed with {}: {}", context, status, description);
        Err(NvError::OperationFailed {
            status,
            context: context.to_string(),
            description,
        })
    }
}

impl StatusChecker<NvApiSource> {
    pub fn nvapi(config: NvApiConfig) -> Self {
        Self::new(NvApiSource::new(config))
    }
}

pub fn check(status: NvStatus, context: &str) -> Result<(), NvError> {
    if status.is_ok() {
        return Ok(());
    }
    StatusChecker::nvapi(NvApiConfig::from_env()).check(status, context)
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
        path::PathBuf,
        rc::Rc,
    };

    use super::{StatusChecker, check};
    use crate::{
        config::{LIBRARY_ENV, NvApiConfig},
        error::NvError,
        session::{Offline, VendorSession},
        status::NvStatus,
    };

    struct StubSession {
        descriptions: HashMap<NvStatus, String>,
        drops: Rc<Cell<usize>>,
    }

    impl VendorSession for StubSession {
        fn describe(&self, status: NvStatus) -> Result<String, NvError> {
            self.descriptions
                .get(&status)
                .cloned()
                .ok_or(NvError::Lookup {
                    status,
                    returned: NvStatus::INVALID_ARGUMENT,
                })
        }
    }

    impl Drop for StubSession {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    struct Harness {
        opened: Rc<Cell<usize>>,
        dropped: Rc<Cell<usize>>,
        descriptions: Rc<RefCell<HashMap<NvStatus, String>>>,
    }

    impl Harness {
        fn new() -> Self {
            let mut descriptions = HashMap::new();
            descriptions.insert(
                NvStatus::NOT_SUPPORTED,
                "Feature not supported on this device.".to_string(),
            );
            descriptions.insert(NvStatus::INVALID_HANDLE, "Invalid handle.".to_string());
            Self {
                opened: Rc::new(Cell::new(0)),
                dropped: Rc::new(Cell::new(0)),
                descriptions: Rc::new(RefCell::new(descriptions)),
            }
        }

        fn checker(
            &self,
        ) -> StatusChecker<impl Fn() -> Result<StubSession, NvError>> {
            let opened = self.opened.clone();
            let dropped = self.dropped.clone();
            let descriptions = self.descriptions.clone();
            StatusChecker::new(move || {
                opened.set(opened.get() + 1);
                Ok(StubSession {
                    descriptions: descriptions.borrow().clone(),
                    drops: dropped.clone(),
                })
            })
        }
    }

    #[test]
    fn success_opens_no_session() {
        let harness = Harness::new();
        let checker = harness.checker();
        for context in ["init", "", "Failed to initialize device"] {
            assert!(checker.check(NvStatus::OK, context).is_ok());
        }
        assert_eq!(harness.opened.get(), 0);
    }

    #[test]
    fn failure_message_is_context_then_description() {
        let harness = Harness::new();
        let err = harness
            .checker()
            .check(NvStatus::NOT_SUPPORTED, "Query failed.")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Query failed. Error: Feature not supported on this device."
        );
        assert_eq!(err.status(), Some(NvStatus::NOT_SUPPORTED));
        assert_eq!(harness.opened.get(), 1);
        assert_eq!(harness.dropped.get(), 1);
    }

    #[test]
    fn empty_context_keeps_separator() {
        let harness = Harness::new();
        let err = harness
            .checker()
            .check(NvStatus::INVALID_HANDLE, "")
            .unwrap_err();
        assert_eq!(err.to_string(), " Error: Invalid handle.");
    }

    #[test]
    fn repeated_failures_are_independent() {
        let harness = Harness::new();
        let checker = harness.checker();
        let first = checker.check(NvStatus::NOT_SUPPORTED, "ctx").unwrap_err();
        let second = checker.check(NvStatus::NOT_SUPPORTED, "ctx").unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(harness.opened.get(), 2);
        assert_eq!(harness.dropped.get(), 2);
    }

    #[test]
    fn describe_failure_propagates_unchanged() {
        let harness = Harness::new();
        let err = harness
            .checker()
            .check(NvStatus::DEVICE_BUSY, "Set sync state")
            .unwrap_err();
        assert!(matches!(
            err,
            NvError::Lookup {
                status: NvStatus::DEVICE_BUSY,
                returned: NvStatus::INVALID_ARGUMENT,
            }
        ));
        assert_eq!(harness.dropped.get(), 1, "session released after failed lookup");
    }

    #[test]
    fn open_failure_propagates_unchanged() {
        let checker = StatusChecker::new(|| -> Result<StubSession, NvError> {
            Err(NvError::Initialize(NvStatus::NVIDIA_DEVICE_NOT_FOUND))
        });
        let err = checker.check(NvStatus::ERROR, "Enumerate GPUs").unwrap_err();
        assert!(matches!(
            err,
            NvError::Initialize(NvStatus::NVIDIA_DEVICE_NOT_FOUND)
        ));
    }

    #[test]
    fn offline_checker_uses_table_descriptions() {
        let checker = StatusChecker::new(Offline);
        assert!(checker.check(NvStatus::OK, "init").is_ok());
        let err = checker
            .check(NvStatus::NOT_SUPPORTED, "Query failed.")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Query failed. Error: Requested feature is not supported in the selected GPU."
        );
    }

    #[test]
    fn default_check_loads_library_only_on_failure() {
        let missing = PathBuf::from("/nonexistent/nvstatus-test/libnvidia-api.so");
        std::env::set_var(LIBRARY_ENV, &missing);
        assert_eq!(NvApiConfig::from_env().library_path, missing);

        assert!(check(NvStatus::OK, "init").is_ok());

        let err = check(NvStatus::ERROR, "ctx").unwrap_err();
        std::env::remove_var(LIBRARY_ENV);
        match err {
            NvError::LibraryLoad { path, .. } => assert_eq!(path, missing),
            other => panic!("open failure was not propagated as-is: {other}"),
        }
    }
}
