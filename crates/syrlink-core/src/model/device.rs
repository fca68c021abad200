// ── Registered devices ──

use serde::Serialize;
use syrlink_api::parser::{DeviceRecord, ProjectRecord};

/// A softener known to the account, flattened across projects.
///
/// The stable identifier is the vendor serial number when the backend
/// reports one, otherwise the collection id. Collection ids have been
/// observed to change when a device is re-registered; serials have not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// Stable identifier: serial number, or collection id as fallback.
    pub id: String,
    /// Display name, backed by the portal alias when one is set.
    pub name: String,
    /// Vendor serial number, when reported.
    pub serial: Option<String>,
    /// Device collection guid used on the wire.
    pub collection_id: String,
    /// Project the device belongs to.
    pub project_id: String,
    /// Human-readable project name.
    pub project_name: String,
}

impl Device {
    pub(crate) fn from_record(record: DeviceRecord, project: &ProjectRecord) -> Self {
        let id = record
            .serial
            .clone()
            .unwrap_or_else(|| record.collection_id.clone());
        let name = record.display_name().to_owned();
        Self {
            id,
            name,
            serial: record.serial,
            collection_id: record.collection_id,
            project_id: project.id.clone(),
            project_name: project.name.clone(),
        }
    }

    /// True when `identifier` names this device by id, serial or
    /// collection id.
    #[must_use]
    pub fn matches(&self, identifier: &str) -> bool {
        self.id == identifier
            || self.collection_id == identifier
            || self.serial.as_deref() == Some(identifier)
    }
}

/// Salt container capacity in kilograms for a given model string.
///
/// The device reports the absolute salt stock (`getSV1`) but not the
/// container size; that comes from the model name (`getCNA`). Unknown
/// models fall back to the LEX plus value.
#[must_use]
pub fn salt_capacity_kg(model: &str) -> u32 {
    match model.trim().to_lowercase().as_str() {
        "neosoft2500" => 40,
        "neosoft5000" => 35,
        _ => 25,
    }
}
