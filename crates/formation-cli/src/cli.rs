//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formation_core::CreationPolicy;

/// Formation - Create platform resources from declarative templates
#[derive(Parser, Debug)]
#[command(name = "formation")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create or fetch every resource a template describes
    ///
    /// Each node of the template is annotated with the id of its resource.
    ///
    /// Examples:
    ///   formation apply site.yaml --state platform.json
    ///   formation apply site.yaml --state platform.json --policy get-or-create
    ///   formation apply folders.yaml --state platform.json --parent syn1 -o out.yaml
    Apply {
        /// Template file (YAML or JSON)
        template: PathBuf,

        /// Platform state file, created if missing
        #[arg(short, long, env = "FORMATION_STATE")]
        state: PathBuf,

        /// Conflict policy: create-only, get-or-create or create-or-update
        #[arg(short, long)]
        policy: Option<CreationPolicy>,

        /// Existing container id top-level nodes are placed under
        #[arg(long)]
        parent: Option<String>,

        /// Write the annotated template here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the annotated template as JSON
        #[arg(long)]
        json: bool,

        /// Print the tree of resolved resources
        #[arg(long)]
        tree: bool,
    },

    /// Check a template without contacting the platform
    Validate {
        /// Template file (YAML or JSON)
        template: PathBuf,

        /// Container id the template would be applied under
        #[arg(long)]
        parent: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List the resources held in a platform state file
    Inspect {
        /// Platform state file
        #[arg(short, long, env = "FORMATION_STATE")]
        state: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
