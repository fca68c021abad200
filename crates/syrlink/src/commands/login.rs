//! `syrlink login`: force a fresh authentication and show what the
//! account can see.

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
    let session = coordinator
        .client()
        .login()
        .await
        .map_err(CoreError::from)?;

    if !global.quiet {
        eprintln!(
            "Authenticated; session valid for {} min, {} project(s) visible",
            session.expires_in().as_secs() / 60,
            session.projects.len()
        );
    }

    let out = output::render_list(
        &global.output,
        &session.projects,
        |p| ProjectRow {
            id: p.id.clone(),
            name: p.name.clone(),
        },
        |p| p.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
