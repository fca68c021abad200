//! Write commands: `regenerate`, `reset` and the low-level `set`.

use syrlink_core::{Coordinator, DeviceAction};

use crate::cli::{GlobalOpts, RegenerateArgs, ResetArgs, SetArgs};
use crate::commands::util;
use crate::error::CliError;

pub async fn regenerate(
    coordinator: &Coordinator,
    args: RegenerateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let action = if args.multi {
        DeviceAction::MultiRegenerate
    } else {
        DeviceAction::RegenerateNow
    };
    coordinator.trigger_action(&args.device, action).await?;
    if !global.quiet {
        eprintln!("Requested {action} on '{}'", args.device);
    }
    Ok(())
}

pub async fn reset(
    coordinator: &Coordinator,
    args: ResetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let prompt = format!("Reset counters on '{}'?", args.device);
    if !util::confirm(&prompt, global.yes)? {
        if !global.quiet {
            eprintln!("Aborted");
        }
        return Ok(());
    }
    coordinator
        .trigger_action(&args.device, DeviceAction::Reset)
        .await?;
    if !global.quiet {
        eprintln!("Counters reset on '{}'", args.device);
    }
    Ok(())
}

pub async fn set(
    coordinator: &Coordinator,
    args: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let value = util::parse_action_value(&args.value);
    coordinator
        .set_value(&args.device, &args.command, value)
        .await?;
    if !global.quiet {
        eprintln!("Sent {}={} to '{}'", args.command, args.value, args.device);
    }
    Ok(())
}
