//! Command handlers. Each submodule owns one subcommand: it drives the
//! coordinator and renders the result through [`crate::output`].

pub mod actions;
pub mod config_cmd;
pub mod devices;
pub mod login;
pub mod projects;
pub mod stats;
pub mod status;
pub mod util;
pub mod watch;

use syrlink_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login => login::handle(coordinator, global).await,
        Command::Projects => projects::handle(coordinator, global).await,
        Command::Devices => devices::handle(coordinator, global).await,
        Command::Status(args) => status::handle(coordinator, args, global).await,
        Command::Watch(_) => watch::handle(coordinator, global).await,
        Command::Regenerate(args) => actions::regenerate(coordinator, args, global).await,
        Command::Reset(args) => actions::reset(coordinator, args, global).await,
        Command::Set(args) => actions::set(coordinator, args, global).await,
        Command::Stats(args) => stats::handle(coordinator, args, global).await,
        // Handled in main before a coordinator exists
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
