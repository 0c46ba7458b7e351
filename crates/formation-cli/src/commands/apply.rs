//! Apply command implementation

use std::path::{Path, PathBuf};

use colored::Colorize;
use formation_core::template::NestedResource;
use formation_core::{
    CreationPolicy, LocalPlatform, OutputFormat, ResolvedSettings, ResourceGateway, Settings,
    SettingsResolver, TemplateWalker,
};
use formation_fs::{DocumentStore, Format};
use serde_json::Value;

use crate::error::{CliError, Result};

/// Arguments of the apply command.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub template: PathBuf,
    pub state: PathBuf,
    pub policy: Option<CreationPolicy>,
    pub parent: Option<String>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub tree: bool,
}

impl ApplyOptions {
    /// Command-line flags as the highest-priority settings layer.
    fn overrides(&self) -> Settings {
        let mut settings = Settings::default();
        settings.gateway.policy = self.policy;
        if self.json {
            settings.output.format = Some(OutputFormat::Json);
        }
        if self.tree {
            settings.output.tree = Some(true);
        }
        settings
    }
}

/// Run the apply command
///
/// Platform state is saved even when the walk fails, since resources
/// resolved before the failure exist. With `--output`, the partially
/// annotated template is written too.
pub fn run_apply(cwd: &Path, options: &ApplyOptions) -> Result<()> {
    let settings = SettingsResolver::new(cwd).resolve_with(&options.overrides())?;
    tracing::debug!(?settings, "resolved settings");

    let store = DocumentStore::new();
    let mut template: Value = store.load_template(&options.template)?;
    let platform = LocalPlatform::open(&options.state)?;

    let mut walker = TemplateWalker::new(ResourceGateway::new(platform, settings.policy));
    let outcome = walker.build_under(&mut template, options.parent.as_deref());

    let platform = walker.into_gateway().into_transport();
    platform.save(&options.state)?;

    if let Some(output) = &options.output {
        let format = Format::from_path(output).unwrap_or(settings.output_format.document_format());
        store.save_as(output, format, &template)?;
    }

    let tree = outcome?;

    match &options.output {
        Some(output) => println!(
            "{} Applied {} resource(s) with policy {}, wrote {}",
            "OK".green().bold(),
            tree.len(),
            settings.policy.to_string().cyan(),
            output.display()
        ),
        None => print!("{}", render(&template, &settings)?),
    }

    if settings.show_tree {
        println!();
        println!("{}", "Resources".bold());
        print_nested(&tree.to_nested(), 1);
    }

    Ok(())
}

fn render(template: &Value, settings: &ResolvedSettings) -> Result<String> {
    formation_fs::render(template, settings.output_format.document_format())
        .map_err(CliError::user)
}

fn print_nested(nodes: &[NestedResource], depth: usize) {
    for node in nodes {
        println!(
            "{}{} {} ({})",
            "  ".repeat(depth),
            node.kind.dimmed(),
            node.name,
            node.id.cyan()
        );
        print_nested(&node.children, depth + 1);
    }
}
