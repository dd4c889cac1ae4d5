//! reloadkit - live script hot-reload for the scene editor.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use reloadkit::cli::{self, Cli, Commands};
use reloadkit::config::ProjectConfig;
use reloadkit::{core, logger};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Commands::Init { dir, dry } = &cli.command {
        return cli::init::init_project(dir.as_deref(), &cli.config, *dry);
    }

    let project = cli.command.project().and_then(|p| p.project.as_deref());
    let mut config = ProjectConfig::load(project, &cli.config)?;

    match &cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Build { .. } => {
            if !cli::build::build_project(&config)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Watch {
            sandbox,
            debounce_ms,
            ..
        } => {
            if let Some(ms) = debounce_ms {
                config.watch.debounce_ms = *ms;
                config.validate()?;
            }
            cli::watch::watch_project(&config, *sandbox)
        }
        Commands::Clean { .. } => cli::clean::clean_project(&config),
        Commands::Types { .. } => cli::types::print_types(&config),
    }
}
