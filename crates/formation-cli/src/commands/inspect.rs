//! Inspect command implementation

use std::path::Path;

use colored::Colorize;
use formation_core::LocalPlatform;

use crate::error::{CliError, Result};

/// Run the inspect command
pub fn run_inspect(state: &Path, json: bool) -> Result<()> {
    if !state.exists() {
        return Err(CliError::user(format!(
            "State file not found: {}",
            state.display()
        )));
    }
    let platform = LocalPlatform::load(state)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&platform).map_err(|e| CliError::user(e.to_string()))?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("{}", "Resources".bold());
    if platform.records().is_empty() {
        println!("  {}", "None".dimmed());
    }
    for record in platform.records() {
        let parent = record
            .entity
            .parent_id()
            .map(|p| format!(" in {}", p))
            .unwrap_or_default();
        println!(
            "  {:<10} {:<8} {}{}",
            record.entity.kind().to_string().cyan(),
            record.id,
            record.entity.name(),
            parent.dimmed()
        );
        for (principal, access) in &record.acl {
            let access: Vec<&str> = access.iter().map(|a| a.as_str()).collect();
            println!("      {} {} {}", "acl".dimmed(), principal, access.join(","));
        }
    }

    if !platform.challenges().is_empty() {
        println!();
        println!("{}", "Challenges".bold());
        for challenge in platform.challenges() {
            println!(
                "  {:<8} project {} team {}",
                challenge.id, challenge.project_id, challenge.participant_team_id
            );
        }
    }

    if !platform.invitations().is_empty() {
        println!();
        println!(
            "{} {} invitation(s) sent",
            "Invitations:".bold(),
            platform.invitations().len()
        );
    }

    Ok(())
}
