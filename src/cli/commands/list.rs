//! `dhf list` command - entities of one class in identifier order

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{load_workspace, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{EntityClass, Record};

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Entity class (user_needs, product_requirements,
    /// software_specifications, hardware_specifications, risks)
    pub class: EntityClass,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = load_workspace(&global.data_file)?;
    let records: Vec<Record> = workspace.store().list(args.class).collect();

    match global.format {
        OutputFormat::Json => {
            #[derive(serde::Serialize)]
            struct Row {
                id: String,
                title: String,
            }
            let rows: Vec<Row> = records
                .iter()
                .map(|r| Row {
                    id: r.id().to_string(),
                    title: r.title().to_string(),
                })
                .collect();
            let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            for record in &records {
                let yaml = record_yaml(record)?;
                println!("---");
                print!("{}", yaml);
            }
        }
        OutputFormat::Id => {
            for record in &records {
                println!("{}", record.id());
            }
        }
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["ID", "TITLE", "DETAIL"]);
            for record in &records {
                let detail = match record {
                    Record::Requirement(req) => format!("verify by {}", req.verification_method),
                    Record::Specification(spec) => spec.module.clone(),
                    Record::Risk(risk) => risk.category.clone(),
                    Record::UserNeed(_) => String::new(),
                };
                builder.push_record([
                    record.id().to_string(),
                    truncate_str(record.title(), 40),
                    detail,
                ]);
            }
            println!("{}", builder.build().with(Style::markdown()));
            println!();
            println!(
                "{} {}(s) found",
                style(records.len()).cyan(),
                args.class.display_name()
            );
        }
    }

    Ok(())
}

pub(crate) fn record_yaml(record: &Record) -> Result<String> {
    let yaml = match record {
        Record::UserNeed(n) => serde_yml::to_string(n),
        Record::Requirement(r) => serde_yml::to_string(r),
        Record::Specification(s) => serde_yml::to_string(s),
        Record::Risk(r) => serde_yml::to_string(r),
    };
    yaml.into_diagnostic()
}
