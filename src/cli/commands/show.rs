//! `dhf show` command - one entity, full fidelity

use miette::{IntoDiagnostic, Result};

use crate::cli::commands::list::record_yaml;
use crate::cli::helpers::load_workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::ItemId;

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Entity identifier (e.g. UN001, PR001.2, SW001, R001)
    pub id: ItemId,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = load_workspace(&global.data_file)?;
    let record = workspace
        .store()
        .get(&args.id)
        .map_err(|e| miette::miette!("{}", e))?;

    match global.format {
        OutputFormat::Json => {
            let value: serde_json::Value =
                serde_yml::from_str(&record_yaml(&record)?).into_diagnostic()?;
            let json = serde_json::to_string_pretty(&value).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => println!("{}", record.id()),
        _ => print!("{}", record_yaml(&record)?),
    }

    Ok(())
}
