// syrlink-core: domain model and polling engine for SYR Connect
// water softeners. Wraps the wire client from syrlink-api in a
// discovery cache, a concurrent poll cycle and snapshot publishing.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;

pub use config::{AccountConfig, DEFAULT_POLL_INTERVAL};
pub use coordinator::Coordinator;
pub use error::CoreError;
pub use model::{Device, DeviceFailure, DeviceState, FailureKind, SoftenerReading, StatusSnapshot};

// Re-exported so front ends depending on syrlink-core alone can name
// wire-level argument and result types.
pub use syrlink_api::parser::{DeviceStatusData, StatisticsSeries};
pub use syrlink_api::payload::{ActionValue, DeviceAction, StatisticsKind};
pub use syrlink_api::value::StatusValue;
pub use syrlink_api::{SessionState, SyrClient};
