//! `inbox`: build and query framework in-box package tables.

mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::generate::GenerateArgs;
use config::InboxConfig;

#[derive(Parser)]
#[command(name = "inbox", version, about = "Framework in-box NuGet package tables")]
struct Cli {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Path to inbox.toml (default: search upward from the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the tables from the package registry and write Rust modules
    Generate {
        /// Directory for the generated modules
        #[arg(long)]
        output: Option<PathBuf>,
        /// Read packages from a local mirror directory
        #[arg(long)]
        mirror: Option<PathBuf>,
        /// Skip reference assembly evaluation
        #[arg(long)]
        no_assemblies: bool,
    },
    /// Check whether a package version ships with a framework
    Check {
        /// Target framework (e.g., netcoreapp2.1, net6.0)
        framework: String,
        /// Package id
        package: String,
        /// Package version
        version: String,
        /// Framework family (default, aspnetcore, windowsdesktop)
        #[arg(long)]
        family: Option<String>,
    },
    /// Show the effective table of a framework, including inherited entries
    Show {
        /// Target framework
        framework: String,
        /// Framework family (default, aspnetcore, windowsdesktop)
        #[arg(long)]
        family: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Generate {
            output,
            mirror,
            no_assemblies,
        } => {
            let (config, config_dir) = load_config(&cwd, cli.config.as_deref())?;
            let args = GenerateArgs {
                output,
                mirror,
                no_assemblies,
            };
            commands::generate::run(&config, &config_dir, &args)
        }

        Commands::Check {
            framework,
            package,
            version,
            family,
        } => commands::check::run(&framework, &package, &version, family.as_deref()),

        Commands::Show { framework, family } => {
            commands::show::run(&framework, family.as_deref())
        }
    }
}

/// The configuration to use and the directory its relative paths resolve
/// against. Without a config file the defaults apply.
fn load_config(cwd: &Path, explicit: Option<&Path>) -> Result<(InboxConfig, PathBuf)> {
    if let Some(path) = explicit {
        let config = InboxConfig::load(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => cwd.to_path_buf(),
        };
        return Ok((config, dir));
    }

    match InboxConfig::find_and_load(cwd)? {
        Some((config, dir)) => {
            debug!(dir = %dir.display(), "loaded {}", config::CONFIG_FILE);
            Ok((config, dir))
        }
        None => Ok((InboxConfig::default(), cwd.to_path_buf())),
    }
}
