//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::Path;

use crate::core::{Document, Workspace, WorkspaceError};

/// Load and validate the data file, rejecting it wholesale on fatal
/// violations (each violation is printed before the command fails)
pub fn load_workspace(data_file: &Path) -> Result<Workspace> {
    let content = std::fs::read_to_string(data_file)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read data file {}", data_file.display()))?;
    let document = Document::from_yaml(&content).into_diagnostic()?;

    match Workspace::load(document) {
        Ok(workspace) => Ok(workspace),
        Err(WorkspaceError::Validation(report)) => {
            crate::cli::commands::validate::print_report(&report);
            Err(miette::miette!(
                "data file rejected: {}",
                report
            ))
        }
        Err(err) => Err(miette::miette!("{}", err)),
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}
