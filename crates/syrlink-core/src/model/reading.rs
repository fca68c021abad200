// ── Typed softener readings ──
//
// `DeviceStatusData` is a raw key/value map straight off the wire. This
// module lifts the readings every softener reports into a typed view so
// front ends stop string-matching command names.

use serde::Serialize;
use syrlink_api::parser::DeviceStatusData;
use syrlink_api::value::StatusValue;

use super::device::salt_capacity_kg;

/// Common softener metrics extracted from one status readout.
///
/// Every field is optional: firmware revisions differ in which
/// commands they answer, and a missing reading is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoftenerReading {
    /// Model name (`getCNA`).
    pub model: Option<String>,
    /// Software revision (`getVER`).
    pub firmware: Option<String>,
    /// Hardware revision (`getFIR`).
    pub hardware: Option<String>,
    /// Serial number as reported by the device itself (`getSRN`).
    pub serial: Option<String>,
    /// Inlet pressure in bar. The wire value (`getPRS`) is tenths.
    pub pressure_bar: Option<f64>,
    /// Current water flow (`getFLO`).
    pub flow: Option<f64>,
    /// Soft-water capacity left before regeneration, in litres
    /// (`getRES`).
    pub capacity_remaining_l: Option<f64>,
    /// Salt in the container, in kilograms (`getSV1`).
    pub salt_stock_kg: Option<f64>,
    /// Salt stock as a share of the per-model container size, derived
    /// from `getSV1` and the model lookup. Rounded to whole percent.
    pub salt_stock_pct: Option<f64>,
    /// Salt supply in weeks as estimated by the device (`getSS1`).
    pub salt_weeks_remaining: Option<f64>,
    /// Exchanger capacity as a percentage (`getCS1`).
    pub resin_capacity_pct: Option<f64>,
    /// Completed regenerations over the device lifetime (`getTOR`).
    pub total_regenerations: Option<i64>,
    /// True while a regeneration is running (`getSRE`).
    pub regenerating: Option<bool>,
    /// Alarm code (`getALA`); `FF` (or `0` on LEX Plus) means none.
    pub alarm_code: Option<String>,
    /// Notification code (`getNOT`); `FF` means none.
    pub notification_code: Option<String>,
    /// Warning code (`getWRN`); `FF` means none.
    pub warning_code: Option<String>,
}

impl SoftenerReading {
    #[must_use]
    pub fn from_status(status: &DeviceStatusData) -> Self {
        let text = |key: &str| {
            status
                .reading(key)
                .and_then(StatusValue::as_str)
                .map(str::to_owned)
        };
        let number = |key: &str| status.reading(key).and_then(StatusValue::as_f64);
        let counter = |key: &str| status.reading(key).and_then(StatusValue::as_i64);
        // Codes like `A5` stay text, but `01` has already been coerced
        // to a number by the time it gets here, so render the value
        // back instead of requiring text.
        let code = |key: &str| status.reading(key).map(ToString::to_string);

        let model = text("getCNA");
        let salt_stock_kg = number("getSV1");
        let salt_stock_pct = salt_stock_kg.map(|kg| {
            let capacity = salt_capacity_kg(model.as_deref().unwrap_or_default());
            (kg / f64::from(capacity) * 100.0).round()
        });

        Self {
            model,
            firmware: text("getVER"),
            hardware: text("getFIR"),
            serial: text("getSRN"),
            pressure_bar: number("getPRS").map(|tenths| tenths / 10.0),
            flow: number("getFLO"),
            capacity_remaining_l: number("getRES"),
            salt_stock_kg,
            salt_stock_pct,
            salt_weeks_remaining: number("getSS1"),
            resin_capacity_pct: number("getCS1"),
            total_regenerations: counter("getTOR"),
            regenerating: status.reading("getSRE").and_then(StatusValue::as_bool),
            alarm_code: code("getALA"),
            notification_code: code("getNOT"),
            warning_code: code("getWRN"),
        }
    }
}
