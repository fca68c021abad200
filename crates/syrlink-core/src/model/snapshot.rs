// ── Polling snapshots ──
//
// Each polling cycle produces one `StatusSnapshot` covering every
// registered device. A device that failed to answer is carried as
// `DeviceState::Failed` inside an otherwise successful snapshot; the
// cycle itself only fails when discovery does.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use syrlink_api::parser::DeviceStatusData;

use crate::model::SoftenerReading;

/// Broad classification of a per-device fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transport-level failure: unreachable, timeout, HTTP error.
    Connection,
    /// The backend answered with something unparseable.
    Decode,
    /// The session died and could not be re-established in time.
    Session,
    /// The backend returned an explicit fault for this device.
    Vendor,
    /// A failure on our side of the wire.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connection => "connection",
            Self::Decode => "decode",
            Self::Session => "session",
            Self::Vendor => "vendor",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Why one device produced no status this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl DeviceFailure {
    pub(crate) fn from_error(err: &syrlink_api::Error) -> Self {
        let kind = match err {
            syrlink_api::Error::Connection(_) => FailureKind::Connection,
            syrlink_api::Error::Decode { .. } => FailureKind::Decode,
            syrlink_api::Error::SessionExpired | syrlink_api::Error::Authentication { .. } => {
                FailureKind::Session
            }
            syrlink_api::Error::Vendor { .. } => FailureKind::Vendor,
            syrlink_api::Error::Validation { .. } | syrlink_api::Error::InvalidUrl(_) => {
                FailureKind::Internal
            }
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of one device in one polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeviceState {
    Ready(DeviceStatusData),
    Failed(DeviceFailure),
}

impl DeviceState {
    #[must_use]
    pub fn status(&self) -> Option<&DeviceStatusData> {
        match self {
            Self::Ready(status) => Some(status),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&DeviceFailure> {
        match self {
            Self::Ready(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    /// Typed view of the readings, when the fetch succeeded.
    #[must_use]
    pub fn reading(&self) -> Option<SoftenerReading> {
        self.status().map(SoftenerReading::from_status)
    }
}

/// All device states from one polling cycle, keyed by device id.
///
/// Snapshots are immutable once published; the coordinator replaces the
/// whole map instead of patching entries, so a device that vanished
/// from the account vanishes from the next snapshot too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// When the cycle finished.
    pub taken_at: DateTime<Utc>,
    pub devices: BTreeMap<String, DeviceState>,
}

impl StatusSnapshot {
    pub(crate) fn new(devices: BTreeMap<String, DeviceState>) -> Arc<Self> {
        Arc::new(Self {
            taken_at: Utc::now(),
            devices,
        })
    }

    #[must_use]
    pub fn device(&self, id: &str) -> Option<&DeviceState> {
        self.devices.get(id)
    }

    /// Number of devices that answered this cycle.
    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.devices
            .values()
            .filter(|state| matches!(state, DeviceState::Ready(_)))
            .count()
    }

    /// Number of devices that failed this cycle.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.devices.len() - self.ready_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ready() -> DeviceState {
        DeviceState::Ready(DeviceStatusData {
            collection_id: "dcl-1".to_owned(),
            metadata: BTreeMap::new(),
            readings: BTreeMap::new(),
        })
    }

    #[test]
    fn counts_split_ready_from_failed() {
        let mut devices = BTreeMap::new();
        devices.insert("a".to_owned(), ready());
        devices.insert(
            "b".to_owned(),
            DeviceState::Failed(DeviceFailure {
                kind: FailureKind::Connection,
                message: "connect refused".to_owned(),
            }),
        );
        let snapshot = StatusSnapshot::new(devices);
        assert_eq!(snapshot.ready_count(), 1);
        assert_eq!(snapshot.failed_count(), 1);
        assert!(snapshot.device("a").unwrap().status().is_some());
        assert!(snapshot.device("b").unwrap().failure().is_some());
    }

    #[test]
    fn failure_classification_tracks_the_source_error() {
        let failure = DeviceFailure::from_error(&syrlink_api::Error::SessionExpired);
        assert_eq!(failure.kind, FailureKind::Session);

        let failure = DeviceFailure::from_error(&syrlink_api::Error::Vendor {
            code: "10".to_owned(),
            message: "denied".to_owned(),
        });
        assert_eq!(failure.kind, FailureKind::Vendor);
        assert_eq!(failure.to_string(), "vendor: Vendor fault 10: denied");
    }
}
