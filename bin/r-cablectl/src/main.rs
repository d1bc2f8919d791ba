//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Command line front end for topology analysis and cable sizing."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use r_cable_common::{init_tracing, AppConfig, LoadedAppConfig};
use r_cable_engine::CalcEngineError;

mod analyze;
mod config;

/// Exit status when no root bus can be derived from the input.
const EXIT_STRUCTURAL: u8 = 2;

const CONFIG_CANDIDATES: &[&str] = &["r-cable.toml", "configs/r-cable.toml"];

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "R-CABLE topology analysis and cable sizing",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline and export reports.
    Analyze(analyze::AnalyzeArgs),
    /// Show root detection and discovered paths without sizing.
    Topology(analyze::TopologyArgs),
    /// Size one segment and print its result as JSON.
    Size(analyze::SizeArgs),
    #[command(subcommand, about = "Configuration actions")]
    Config(config::ConfigCommand),
}

/// Load `explicit` when given, otherwise the `R_CABLE_CONFIG` override or the
/// first existing default candidate, falling back to built-in defaults.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<LoadedAppConfig> {
    match explicit {
        Some(path) => Ok(LoadedAppConfig {
            config: AppConfig::from_path(path)?,
            source: Some(path.to_path_buf()),
        }),
        None => {
            let candidates: Vec<PathBuf> = CONFIG_CANDIDATES.iter().map(PathBuf::from).collect();
            AppConfig::load_or_default(&candidates)
        }
    }
}

pub(crate) fn start_logging(loaded: &LoadedAppConfig) -> Result<()> {
    init_tracing("r-cablectl", &loaded.config.logging).context("failed to initialise logging")
}

fn version_line() -> String {
    format!(
        "r-cablectl {} (engine {})",
        env!("CARGO_PKG_VERSION"),
        r_cable_engine::VERSION
    )
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };
    match command {
        Commands::Analyze(args) => analyze::run_analyze(args),
        Commands::Topology(args) => analyze::run_topology(args),
        Commands::Size(args) => analyze::run_size(args),
        Commands::Config(cmd) => config::run(cmd),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", version_line());
        return ExitCode::SUCCESS;
    }
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let structural = err
                .downcast_ref::<CalcEngineError>()
                .is_some_and(CalcEngineError::is_structural);
            if structural {
                ExitCode::from(EXIT_STRUCTURAL)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
