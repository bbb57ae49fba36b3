use crate::{error::NvError, status::NvStatus};

/// A live handle to the vendor API, able to turn a status into text.
///
/// Whatever the session holds is released when it is dropped.
pub trait VendorSession {
    fn describe(&self, status: NvStatus) -> Result<String, NvError>;
}

pub trait SessionSource {
    type Session: VendorSession;

    fn open(&self) -> Result<Self::Session, NvError>;
}

impl<F, S> SessionSource for F
where
    F: Fn() -> Result<S, NvError>,
    S: VendorSession,
{
    type Session = S;

    fn open(&self) -> Result<S, NvError> {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSession;

impl VendorSession for OfflineSession {
    fn describe(&self, status: NvStatus) -> Result<String, NvError> {
        Ok(match status.info() {
            Some(info) => info.description.to_string(),
            None => format!("Unknown NvAPI status {}", status.raw()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl SessionSource for Offline {
    type Session = OfflineSession;

    fn open(&self) -> Result<OfflineSession, NvError> {
        Ok(OfflineSession)
    }
}

#[cfg(test)]
mod tests {
    use super::{Offline, OfflineSession, SessionSource, VendorSession};
    use crate::{error::NvError, status::NvStatus};

    #[test]
    fn offline_describes_known_codes() {
        let session = Offline.open().unwrap();
        assert_eq!(
            session.describe(NvStatus::INVALID_HANDLE).unwrap(),
            "Invalid handle."
        );
    }

    #[test]
    fn offline_never_fails_for_unknown_codes() {
        let text = OfflineSession.describe(NvStatus::from_raw(-4242)).unwrap();
        assert_eq!(text, "Unknown NvAPI status -4242");
    }

    #[test]
    fn closures_act_as_sources() {
        let source = || -> Result<OfflineSession, NvError> { Ok(OfflineSession) };
        let session = source.open().unwrap();
        assert!(session.describe(NvStatus::ERROR).is_ok());
    }
}
