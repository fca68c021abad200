//! `syrlink status`: one-shot status readout, for a single softener or
//! for every device on the account.

use syrlink_core::{Coordinator, DeviceState, DeviceStatusData, SoftenerReading, StatusSnapshot};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Pressure")]
    pressure: String,
    #[tabled(rename = "Flow")]
    flow: String,
    #[tabled(rename = "Capacity")]
    capacity: String,
    #[tabled(rename = "Salt")]
    salt: String,
    #[tabled(rename = "Regen")]
    regen: String,
    #[tabled(rename = "State")]
    state: String,
}

pub async fn handle(
    coordinator: &Coordinator,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.device {
        Some(ref identifier) => single(coordinator, identifier, global).await,
        None => all(coordinator, global).await,
    }
}

async fn single(
    coordinator: &Coordinator,
    identifier: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let status = coordinator.device_status(identifier).await?;
    let out = output::render_single(&global.output, &status, detail, |s| s.collection_id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn all(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = coordinator.devices().await?;
    let snapshot = coordinator.poll_once().await?;
    let color = output::should_color(&global.color);

    let name_of = |id: &str| -> String {
        devices
            .iter()
            .find(|d| d.id == id)
            .map_or_else(|| id.to_owned(), |d| d.name.clone())
    };

    let out = output::render_single(
        &global.output,
        snapshot.as_ref(),
        |snap| summary_table(snap, &name_of, color),
        |snap| {
            snap.devices
                .iter()
                .map(|(id, state)| {
                    let marker = if state.status().is_some() { "ok" } else { "failed" };
                    format!("{id}\t{marker}")
                })
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);

    let failed = snapshot.failed_count();
    if failed > 0 && !global.quiet {
        eprintln!("{failed} device(s) could not be read this cycle");
    }
    Ok(())
}

fn summary_table(
    snapshot: &StatusSnapshot,
    name_of: &impl Fn(&str) -> String,
    color: bool,
) -> String {
    let rows: Vec<StatusRow> = snapshot
        .devices
        .iter()
        .map(|(id, state)| row_for(id, state, name_of, color))
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn row_for(
    id: &str,
    state: &DeviceState,
    name_of: &impl Fn(&str) -> String,
    color: bool,
) -> StatusRow {
    match state {
        DeviceState::Ready(status) => {
            let reading = SoftenerReading::from_status(status);
            StatusRow {
                device: name_of(id),
                model: fmt_text(&reading.model),
                pressure: fmt_num(reading.pressure_bar, "bar"),
                flow: fmt_num(reading.flow, "l/min"),
                capacity: fmt_num(reading.capacity_remaining_l, "l"),
                salt: fmt_num(reading.salt_stock_pct, "%"),
                regen: match reading.regenerating {
                    Some(true) => "yes".into(),
                    _ => "no".into(),
                },
                state: output::state_marker(true, color),
            }
        }
        DeviceState::Failed(failure) => StatusRow {
            device: name_of(id),
            model: "-".into(),
            pressure: "-".into(),
            flow: "-".into(),
            capacity: "-".into(),
            salt: "-".into(),
            regen: "-".into(),
            state: format!("{} ({})", output::state_marker(false, color), failure.kind),
        },
    }
}

/// Aligned key/value lines for the single-device view.
fn detail(status: &DeviceStatusData) -> String {
    let reading = SoftenerReading::from_status(status);
    let regen = match reading.regenerating {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };
    let regenerations = reading
        .total_regenerations
        .map_or_else(|| "-".to_owned(), |n| n.to_string());
    let lines = [
        format!("Model:         {}", fmt_text(&reading.model)),
        format!("Firmware:      {}", fmt_text(&reading.firmware)),
        format!("Hardware:      {}", fmt_text(&reading.hardware)),
        format!("Serial:        {}", fmt_text(&reading.serial)),
        format!("Pressure:      {}", fmt_num(reading.pressure_bar, "bar")),
        format!("Flow:          {}", fmt_num(reading.flow, "l/min")),
        format!("Capacity left: {}", fmt_num(reading.capacity_remaining_l, "l")),
        format!("Salt stock:    {}", fmt_num(reading.salt_stock_kg, "kg")),
        format!("Salt level:    {}", fmt_num(reading.salt_stock_pct, "%")),
        format!("Salt supply:   {}", fmt_num(reading.salt_weeks_remaining, "weeks")),
        format!("Resin:         {}", fmt_num(reading.resin_capacity_pct, "%")),
        format!("Regenerations: {regenerations}"),
        format!("Regenerating:  {regen}"),
        format!("Alarm:         {}", fmt_code(&reading.alarm_code)),
        format!("Notification:  {}", fmt_code(&reading.notification_code)),
        format!("Warning:       {}", fmt_code(&reading.warning_code)),
        format!("Raw readings:  {}", status.readings.len()),
    ];
    lines.join("\n")
}

fn fmt_num(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".to_owned(), |n| format!("{n} {unit}"))
}

fn fmt_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_owned())
}

/// `FF` (and `0`, on LEX plus firmware) are the protocol's "no event"
/// markers.
fn fmt_code(value: &Option<String>) -> String {
    match value.as_deref() {
        None => "-".to_owned(),
        Some("FF" | "0") => "none".to_owned(),
        Some(code) => code.to_owned(),
    }
}
