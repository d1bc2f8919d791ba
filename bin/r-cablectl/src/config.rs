//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Configuration check and display subcommands."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::load_config;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Validate a configuration file and report where it was found.
    Check(ConfigOptions),
    /// Print the effective configuration as TOML.
    Show(ConfigOptions),
}

#[derive(Debug, Args)]
pub struct ConfigOptions {
    /// Configuration file (defaults to R_CABLE_CONFIG or ./r-cable.toml).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Check(options) => {
            let loaded = load_config(options.config.as_deref())?;
            let settings = loaded.config.analysis_settings()?;
            match &loaded.source {
                Some(path) => println!("configuration OK: {}", path.display()),
                None => println!("no configuration file found; built-in defaults apply"),
            }
            println!(
                "root markers: {}; tie-break: {:?}; path drop limit: {}%",
                settings.root_markers.join(", "),
                settings.tie_break,
                settings.path_voltage_drop_limit_percent
            );
            for (load_type, limit) in &settings.sizing.running_limit_overrides {
                println!("running drop limit for {load_type}: {limit}%");
            }
        }
        ConfigCommand::Show(options) => {
            let loaded = load_config(options.config.as_deref())?;
            print!("{}", loaded.config.to_toml()?);
        }
    }
    Ok(())
}
