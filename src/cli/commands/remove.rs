//! `dhf remove` command - delete one entity and persist the result
//!
//! Deletes never cascade: removing an entity that other records still
//! reference fails and names the blocking referrers, so the audit trail of
//! links is never silently broken.

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::load_workspace;
use crate::cli::GlobalOpts;
use crate::core::ItemId;

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Entity identifier to remove
    pub id: ItemId,
}

pub fn run(args: RemoveArgs, global: &GlobalOpts) -> Result<()> {
    let mut workspace = load_workspace(&global.data_file)?;

    workspace
        .remove(&args.id)
        .map_err(|e| miette::miette!("{}", e))?;

    let yaml = workspace.to_document().to_yaml().into_diagnostic()?;
    std::fs::write(&global.data_file, yaml).map_err(|e| {
        miette::miette!("cannot write data file {}: {}", global.data_file.display(), e)
    })?;

    println!("{} Removed {}", style("OK").green().bold(), style(args.id.to_string()).cyan());
    Ok(())
}
