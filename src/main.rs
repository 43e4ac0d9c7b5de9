//! mapsync - format, check and inspect key-remapping scripts.
//!
//! # Usage
//!
//! ```bash
//! # Reformat in place
//! mapsync fmt --write remap.rhai
//!
//! # Validate, failing on warnings too
//! mapsync check --strict remap.rhai
//!
//! # Show which device blocks apply to a keyboard
//! mapsync inspect remap.rhai --device "SN-0042"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mapsync::branding::{APP_BINARY_NAME, APP_DESCRIPTION};
use mapsync::cli::{
    load_config, CheckArgs, CliError, CliResult, ConfigArgs, ExitCode, FmtArgs, InspectArgs,
    KeysArgs, RenderArgs,
};

#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about = APP_DESCRIPTION, long_about = None)]
struct Cli {
    /// Use this config file instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reformat a script
    Fmt(FmtArgs),
    /// Parse and validate a script
    Check(CheckArgs),
    /// Show the structure of a script
    Inspect(InspectArgs),
    /// Generate a script from a JSON document
    Render(RenderArgs),
    /// Search the known key names
    Keys(KeysArgs),
    /// Show or change configuration
    Config(ConfigArgs),
}

fn run(cli: &Cli) -> CliResult<()> {
    let config_path = cli.config.as_deref();

    match &cli.command {
        Commands::Fmt(args) => args.execute(&load_config(config_path)?),
        Commands::Check(args) => args.execute(&load_config(config_path)?),
        Commands::Inspect(args) => args.execute(&load_config(config_path)?),
        Commands::Render(args) => args.execute(&load_config(config_path)?),
        Commands::Keys(args) => args.execute(),
        Commands::Config(args) => args.execute(config_path),
    }
}

fn report(err: &CliError) {
    match err.kind {
        ExitCode::ParseError => eprint!("{}", ensure_newline(&err.message)),
        _ => eprintln!("Error: {err}"),
    }
}

fn ensure_newline(message: &str) -> String {
    if message.ends_with('\n') {
        message.to_string()
    } else {
        format!("{message}\n")
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(&cli) {
        report(&err);
        std::process::exit(err.exit_code());
    }
}
