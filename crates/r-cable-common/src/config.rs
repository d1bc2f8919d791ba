//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "TOML configuration for analysis runs, defaults, limits, logging and export."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use r_cable_engine::{
    model::LoadType, reports::ExportFormat, AnalysisSettings, PathTieBreak, SegmentDefaults,
    SizingContext, DEFAULT_PATH_DROP_LIMIT_PERCENT, DEFAULT_ROOT_MARKER,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_root_markers() -> Vec<String> {
    vec![DEFAULT_ROOT_MARKER.to_owned()]
}

fn default_path_drop_limit() -> f64 {
    DEFAULT_PATH_DROP_LIMIT_PERCENT
}

fn default_parallel() -> bool {
    true
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_file_enabled() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

/// Primary configuration object for R-CABLE tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub defaults: SegmentDefaults,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and built-in defaults are in effect.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "R_CABLE_CONFIG";

    /// Load configuration from disk, respecting the `R_CABLE_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// Fails when neither the override nor any candidate exists.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        let loaded = Self::locate(std::env::var(Self::ENV_CONFIG_PATH).ok(), candidates)?;
        if loaded.source.is_some() {
            return Ok(loaded);
        }
        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Like [`AppConfig::load_with_source`] but falls back to built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        Self::locate(std::env::var(Self::ENV_CONFIG_PATH).ok(), candidates)
    }

    fn locate<P: AsRef<Path>>(
        env_override: Option<String>,
        candidates: &[P],
    ) -> Result<LoadedAppConfig> {
        if let Some(env_path) = env_override.filter(|p| !p.trim().is_empty()) {
            let path = PathBuf::from(env_path);
            let config = Self::from_path(&path)?;
            return Ok(LoadedAppConfig {
                config,
                source: Some(path),
            });
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!("no configuration file found; using defaults");
        Ok(LoadedAppConfig {
            config: AppConfig::default(),
            source: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<AppConfig>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.limits.validate()?;
        validate_defaults(&self.defaults)?;
        Ok(())
    }

    /// Effective configuration rendered back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render configuration")
    }

    /// Engine settings for this configuration.
    pub fn analysis_settings(&self) -> Result<AnalysisSettings> {
        Ok(AnalysisSettings {
            root_markers: self.analysis.root_markers.clone(),
            tie_break: self.analysis.path_tie_break,
            path_voltage_drop_limit_percent: self.analysis.path_voltage_drop_limit_percent,
            parallel: self.analysis.parallel,
            sizing: SizingContext {
                defaults: self.defaults.clone(),
                running_limit_overrides: self.limits.overrides()?,
            },
            project: self.analysis.project.clone(),
        })
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Case-insensitive substrings marking a destination bus as a root.
    #[serde(default = "default_root_markers")]
    pub root_markers: Vec<String>,
    #[serde(default)]
    pub path_tie_break: PathTieBreak,
    #[serde(default = "default_path_drop_limit")]
    pub path_voltage_drop_limit_percent: f64,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub project: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            root_markers: default_root_markers(),
            path_tie_break: PathTieBreak::default(),
            path_voltage_drop_limit_percent: default_path_drop_limit(),
            parallel: default_parallel(),
            project: None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.root_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(anyhow!(
                "analysis.root_markers must contain at least one non-blank marker"
            ));
        }
        if !(self.path_voltage_drop_limit_percent > 0.0) {
            return Err(anyhow!(
                "analysis.path_voltage_drop_limit_percent must be positive, got {}",
                self.path_voltage_drop_limit_percent
            ));
        }
        Ok(())
    }
}

/// Per-load-type running voltage-drop limits (%), keyed by load type name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default)]
    pub running_drop_percent: IndexMap<String, f64>,
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<()> {
        self.overrides().map(|_| ())
    }

    pub fn overrides(&self) -> Result<IndexMap<LoadType, f64>> {
        self.running_drop_percent
            .iter()
            .map(|(name, limit)| {
                let load_type = LoadType::from_str(name.trim())
                    .map_err(|_| anyhow!("limits.running_drop_percent: unknown load type '{}'", name))?;
                if !(*limit > 0.0) {
                    return Err(anyhow!(
                        "limits.running_drop_percent.{} must be positive, got {}",
                        name,
                        limit
                    ));
                }
                Ok((load_type, *limit))
            })
            .collect()
    }
}

fn validate_defaults(defaults: &SegmentDefaults) -> Result<()> {
    if defaults.cores == 0 {
        return Err(anyhow!("defaults.cores must be at least 1"));
    }
    if defaults.grouped_circuits == 0 {
        return Err(anyhow!("defaults.grouped_circuits must be at least 1"));
    }
    if !(defaults.burial_depth_m > 0.0) {
        return Err(anyhow!(
            "defaults.burial_depth_m must be positive, got {}",
            defaults.burial_depth_m
        ));
    }
    if !(defaults.soil_resistivity_km_w > 0.0) {
        return Err(anyhow!(
            "defaults.soil_resistivity_km_w must be positive, got {}",
            defaults.soil_resistivity_km_w
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    #[serde(default = "default_file_enabled")]
    pub file_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            file_enabled: default_file_enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: ExportFormat::default(),
        }
    }
}
