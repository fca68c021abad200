//! `syrlink projects`: the installation sites visible to the account.

use syrlink_core::{Coordinator, CoreError};
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "Project ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let projects = coordinator
        .client()
        .list_projects()
        .await
        .map_err(CoreError::from)?;

    if projects.is_empty() && !global.quiet {
        eprintln!("No projects on this account");
    }

    let out = output::render_list(
        &global.output,
        &projects,
        |p| ProjectRow {
            id: p.id.clone(),
            name: p.name.clone(),
        },
        |p| p.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
