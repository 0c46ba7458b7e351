//! Validate command implementation

use std::path::Path;

use colored::Colorize;
use formation_fs::DocumentStore;
use serde_json::Value;

use crate::error::{CliError, Result};

/// Run the validate command
pub fn run_validate(template: &Path, parent: Option<&str>, json: bool) -> Result<()> {
    let document: Value = DocumentStore::new().load_template(template)?;
    let summary = formation_core::validate(&document, parent.is_some())?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&summary).map_err(|e| CliError::user(e.to_string()))?;
        println!("{}", rendered);
        return Ok(());
    }

    println!(
        "{} {} is valid: {} resource(s)",
        "OK".green().bold(),
        template.display(),
        summary.resources
    );
    for (kind, count) in &summary.by_kind {
        println!("  {:<10} {}", kind.cyan(), count);
    }
    if summary.annotated > 0 {
        println!(
            "{} {} node(s) already carry an id",
            "Note:".dimmed(),
            summary.annotated
        );
    }

    Ok(())
}
