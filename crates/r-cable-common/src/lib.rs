//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared configuration and logging bootstrap for R-CABLE binaries."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Shared runtime pieces for the R-CABLE workspace: TOML configuration and the
//! tracing subscriber used by the command line tools.

pub mod config;
pub mod logging;

pub use config::{
    AnalysisConfig, AppConfig, ExportConfig, LimitsConfig, LoadedAppConfig, LoggingConfig,
};
pub use logging::{init_tracing, LogFormat};
