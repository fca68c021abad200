//! `syrlink stats`: daily water or salt usage history.

use syrlink_core::{Coordinator, StatisticsKind};
use tabled::Tabled;

use crate::cli::{GlobalOpts, StatsArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Date")]
    label: String,
    #[tabled(rename = "Usage")]
    value: String,
}

pub async fn handle(
    coordinator: &Coordinator,
    args: StatsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind: StatisticsKind = args.kind.into();
    let series = coordinator.statistics(&args.device, kind).await?;

    if series.points.is_empty() && !global.quiet {
        eprintln!("No {kind} history for '{}'", args.device);
    }

    let unit = series.unit.clone();
    let out = output::render_list(
        &global.output,
        &series.points,
        |p| StatRow {
            label: p.label.clone(),
            value: format!("{} {unit}", p.value),
        },
        |p| format!("{}\t{}", p.label, p.value),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
