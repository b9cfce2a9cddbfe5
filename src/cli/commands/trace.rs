//! `dhf trace` command - traceability queries

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{load_workspace, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{EntityClass, ItemId, Workspace};

#[derive(clap::Subcommand, Debug)]
pub enum TraceCommands {
    /// Everything that transitively traces to an entity (requirements built
    /// on a user need, the specs implementing them, the risks they mitigate)
    Down(WalkArgs),

    /// The inverse walk: everything an entity transitively traces to
    Up(WalkArgs),

    /// Entities with no inbound traceability where one is expected
    Orphans(OrphansArgs),
}

#[derive(clap::Args, Debug)]
pub struct WalkArgs {
    /// Entity identifier to start from
    pub id: ItemId,
}

#[derive(clap::Args, Debug)]
pub struct OrphansArgs {
    /// Restrict to one entity class
    #[arg(long, short = 'c')]
    pub class: Option<EntityClass>,
}

pub fn run(cmd: TraceCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TraceCommands::Down(args) => run_walk(args, global, Direction::Down),
        TraceCommands::Up(args) => run_walk(args, global, Direction::Up),
        TraceCommands::Orphans(args) => run_orphans(args, global),
    }
}

enum Direction {
    Down,
    Up,
}

fn run_walk(args: WalkArgs, global: &GlobalOpts, direction: Direction) -> Result<()> {
    let workspace = load_workspace(&global.data_file)?;

    let (label, ids) = match direction {
        Direction::Down => (
            "Traced by",
            workspace
                .downstream_of(&args.id)
                .map_err(|e| miette::miette!("{}", e))?,
        ),
        Direction::Up => (
            "Traces to",
            workspace
                .upstream_of(&args.id)
                .map_err(|e| miette::miette!("{}", e))?,
        ),
    };

    match global.format {
        OutputFormat::Json => {
            let strings: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
            let json = serde_json::to_string_pretty(&strings).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id | OutputFormat::Yaml => {
            for id in &ids {
                println!("{}", id);
            }
        }
        OutputFormat::Table => {
            let start = workspace
                .store()
                .get(&args.id)
                .map_err(|e| miette::miette!("{}", e))?;
            println!(
                "{} {}: {} - {}",
                style(">").blue(),
                label,
                style(args.id.to_string()).cyan(),
                start.title()
            );
            println!();
            if ids.is_empty() {
                println!("  {}", style("(none)").dim());
            }
            for id in &ids {
                print_entity_line(&workspace, id);
            }
        }
    }

    Ok(())
}

fn run_orphans(args: OrphansArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = load_workspace(&global.data_file)?;

    let classes: Vec<EntityClass> = match args.class {
        Some(class) => vec![class],
        None => EntityClass::all().to_vec(),
    };

    let mut orphans: Vec<ItemId> = Vec::new();
    for class in classes {
        orphans.extend(workspace.unlinked(class));
    }

    match global.format {
        OutputFormat::Json => {
            let strings: Vec<String> = orphans.iter().map(|i| i.to_string()).collect();
            let json = serde_json::to_string_pretty(&strings).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id | OutputFormat::Yaml => {
            for id in &orphans {
                println!("{}", id);
            }
        }
        OutputFormat::Table => {
            println!("{}", style("Orphaned Entities").bold());
            println!("{}", style("-".repeat(60)).dim());
            for id in &orphans {
                print_entity_line(&workspace, id);
            }
            println!();
            if orphans.is_empty() {
                println!("{} No orphaned entities found", style("OK").green().bold());
            } else {
                println!("Found {} orphaned entity(ies)", style(orphans.len()).yellow());
            }
        }
    }

    Ok(())
}

fn print_entity_line(workspace: &Workspace, id: &ItemId) {
    let title = workspace
        .store()
        .get(id)
        .map(|r| truncate_str(r.title(), 48))
        .unwrap_or_default();
    println!("  {} - {}", style(id.to_string()).cyan(), title);
}
