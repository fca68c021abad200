// ── Domain model ──

mod device;
mod reading;
mod snapshot;

pub use device::{Device, salt_capacity_kg};
pub use reading::SoftenerReading;
pub use snapshot::{DeviceFailure, DeviceState, FailureKind, StatusSnapshot};
