use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "taskgrid",
    about = "taskgrid — task class inspection for the run-control plane",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Manager configuration file (taskgrid.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and parse class definitions, reporting their resource wants.
    ///
    /// Classes are named by identifier, e.g.
    /// `github.com/org/workflows/tasks/readout@master`.
    Validate {
        /// Class identifiers to check
        #[arg(required = true)]
        classes: Vec<String>,
    },
    /// Print a parsed class definition as JSON
    Show {
        /// Class identifier
        class: String,
    },
}

/// Default log filter. Targets are crate names, so every taskgrid crate is
/// listed.
const LOG_DIRECTIVES: &[&str] = &[
    "info",
    "taskgrid=debug",
    "taskgrid_class=debug",
    "taskgrid_roster=debug",
    "taskgrid_placement=debug",
    "taskgrid_manager=debug",
];

fn env_filter() -> anyhow::Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for directive in LOG_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(env_filter()?).init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { classes } => commands::class::validate(&config, &classes),
        Commands::Show { class } => commands::class::show(&config, &class),
    }
}
