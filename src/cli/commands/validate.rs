//! `dhf validate` command - referential integrity report

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Document, ValidationReport, Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Stay quiet about advisory findings
    #[arg(long)]
    pub allow_orphans: bool,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let content = std::fs::read_to_string(&global.data_file).map_err(|e| {
        miette::miette!("cannot read data file {}: {}", global.data_file.display(), e)
    })?;
    let document = Document::from_yaml(&content).into_diagnostic()?;

    let report = match Workspace::load(document) {
        Ok(workspace) => workspace.validate(),
        Err(WorkspaceError::Validation(report)) => report,
        Err(err) => return Err(miette::miette!("{}", err)),
    };

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&report).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => {
            for violation in report.violations() {
                println!("{}", violation.entity);
            }
        }
        OutputFormat::Table => {
            print_report(&report);
        }
    }

    if report.has_fatal() {
        return Err(miette::miette!("validation failed: {}", report));
    }
    if !args.allow_orphans && report.advisory().next().is_some() {
        // Advisories never block a commit; they only get a closing note
        println!(
            "{} advisory finding(s); pass --allow-orphans to silence this note",
            report.advisory().count()
        );
    }
    Ok(())
}

/// Print a report as styled lines: fatal findings in red, advisories in yellow
pub fn print_report(report: &ValidationReport) {
    if report.is_empty() {
        println!("{} No violations found", style("OK").green().bold());
        return;
    }

    println!("{}", style("Validation Report").bold());
    println!("{}", style("-".repeat(68)).dim());

    for violation in report.violations() {
        let marker = if violation.kind.is_fatal() {
            style("x").red().bold()
        } else {
            style("o").yellow()
        };
        println!(
            "{} {:<10} {:<20} {}",
            marker,
            style(violation.entity.to_string()).cyan(),
            style(violation.kind.to_string()).magenta(),
            violation.detail
        );
    }

    println!();
    println!("{}", report);
}
