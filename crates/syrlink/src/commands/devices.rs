//! `syrlink devices`: every softener across all projects.

use syrlink_core::Coordinator;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Collection")]
    collection: String,
}

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = coordinator.devices().await?;

    if devices.is_empty() && !global.quiet {
        eprintln!("No devices registered on this account");
    }

    let out = output::render_list(
        &global.output,
        devices.as_slice(),
        |d| DeviceRow {
            id: d.id.clone(),
            name: d.name.clone(),
            serial: d.serial.clone().unwrap_or_default(),
            project: d.project_name.clone(),
            collection: d.collection_id.clone(),
        },
        |d| d.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
