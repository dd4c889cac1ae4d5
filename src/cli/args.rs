//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// reloadkit - live script hot-reload for the scene editor
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file name, looked up in the project root (default: reloadkit.toml)
    #[arg(short = 'C', long, global = true, default_value = "reloadkit.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a project with a default config and a sample script
    #[command(visible_alias = "i")]
    Init {
        /// Project directory (default: current directory)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,

        /// Print the config template instead of writing files
        #[arg(long)]
        dry: bool,
    },

    /// Compile every script once and print diagnostics
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Watch the script root and hot-reload on every settled edit
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        project: ProjectArgs,

        /// Spawn one object per addable component type
        #[arg(short, long)]
        sandbox: bool,

        /// Override the quiet period before a burst of edits is compiled
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,
    },

    /// Delete the artifact directory
    #[command(visible_alias = "c")]
    Clean {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Compile and list the component types users can add
    #[command(visible_alias = "t")]
    Types {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

/// Project selection shared by every command that opens a project.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project root (default: nearest directory with a config file)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub project: Option<PathBuf>,
}

impl Commands {
    /// Project selected by the command, if it takes one.
    pub fn project(&self) -> Option<&ProjectArgs> {
        match self {
            Self::Init { .. } => None,
            Self::Build { project }
            | Self::Watch { project, .. }
            | Self::Clean { project }
            | Self::Types { project } => Some(project),
        }
    }
}
