//! `syrlink watch`: run the polling loop and stream each cycle to the
//! terminal until Ctrl-C.

use syrlink_core::{Coordinator, DeviceState, SoftenerReading, StatusSnapshot};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let mut snapshots = coordinator.snapshots();

    let runner = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.run().await }
    });

    if !global.quiet {
        eprintln!(
            "Polling every {}s, Ctrl-C to stop",
            coordinator.config().poll_interval.as_secs()
        );
    }

    loop {
        tokio::select! {
            interrupt = tokio::signal::ctrl_c() => {
                interrupt?;
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    print_cycle(&snapshot, global, color);
                }
            }
        }
    }

    coordinator.shutdown();
    let _ = runner.await;
    Ok(())
}

fn print_cycle(snapshot: &StatusSnapshot, global: &GlobalOpts, color: bool) {
    match global.output {
        // One JSON document per cycle, newline-delimited
        OutputFormat::Json | OutputFormat::JsonCompact => {
            println!(
                "{}",
                serde_json::to_string(snapshot).expect("serialization should not fail")
            );
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let time = snapshot.taken_at.with_timezone(&chrono::Local).format("%H:%M:%S");
            for (id, state) in &snapshot.devices {
                match state {
                    DeviceState::Ready(status) => {
                        let r = SoftenerReading::from_status(status);
                        println!(
                            "{time}  {id}  {}  pressure={}  flow={}  capacity={}  salt={}",
                            output::state_marker(true, color),
                            fmt(r.pressure_bar),
                            fmt(r.flow),
                            fmt(r.capacity_remaining_l),
                            fmt(r.salt_stock_pct),
                        );
                    }
                    DeviceState::Failed(failure) => {
                        println!(
                            "{time}  {id}  {}  {failure}",
                            output::state_marker(false, color)
                        );
                    }
                }
            }
        }
    }
}

fn fmt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |n| n.to_string())
}
