//! `dhf score` command - RBM and residual risk table

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{load_workspace, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ScoreArgs {
    /// Minimum RBM to include
    #[arg(long, default_value = "0")]
    pub min_rbm: u32,

    /// Sort by descending RBM instead of identifier order
    #[arg(long)]
    pub by_rbm: bool,
}

pub fn run(args: ScoreArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = load_workspace(&global.data_file)?;

    #[derive(serde::Serialize)]
    struct ScoredRisk {
        id: String,
        title: String,
        category: String,
        severity: String,
        probability_occurrence: String,
        probability_harm: String,
        rbm: u32,
        ram: u32,
    }

    let mut rows = Vec::new();
    for (id, result) in workspace.score_all() {
        // A validated workspace always resolves its codes
        let score = result.into_diagnostic()?;
        if score.rbm < args.min_rbm {
            continue;
        }
        let risk = workspace
            .store()
            .risk(&id)
            .expect("score_all yields only stored risks");
        rows.push(ScoredRisk {
            id: id.to_string(),
            title: risk.title.clone(),
            category: risk.category.clone(),
            severity: risk.severity.clone(),
            probability_occurrence: risk.probability_occurrence.clone(),
            probability_harm: risk.probability_harm.clone(),
            rbm: score.rbm,
            ram: score.ram,
        });
    }

    if args.by_rbm {
        rows.sort_by(|a, b| b.rbm.cmp(&a.rbm).then_with(|| a.id.cmp(&b.id)));
    }

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&rows).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => {
            for row in &rows {
                println!("{}", row.id);
            }
        }
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["ID", "TITLE", "CATEGORY", "S", "PO", "PH", "RBM", "RAM"]);
            for row in &rows {
                builder.push_record([
                    row.id.clone(),
                    truncate_str(&row.title, 32),
                    row.category.clone(),
                    row.severity.clone(),
                    row.probability_occurrence.clone(),
                    row.probability_harm.clone(),
                    row.rbm.to_string(),
                    row.ram.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::markdown()));
            println!();
            println!("{} risk(s) scored", style(rows.len()).cyan());
        }
    }

    Ok(())
}
