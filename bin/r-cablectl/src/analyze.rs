//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Analyze, topology and size subcommands."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use r_cable_engine::{
    analyze_and_export, inspect_topology,
    io::load_segments_from_file,
    reports::ExportFormat,
    sizing::size_segment,
    AnalysisReport, CableSegment,
};
use r_cable_logging::{cable_info, LogContext};

use crate::{load_config, start_logging};

/// Options shared by every subcommand that reads an edge list.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Cable list (CSV, JSON or YAML).
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Configuration file (defaults to R_CABLE_CONFIG or ./r-cable.toml).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory for exported reports (overrides export.output_dir).
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Report formats to write: json, csv or all.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<ExportFormat>,
}

#[derive(Debug, Args)]
pub struct TopologyArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct SizeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Identifier of the cable to size.
    #[arg(short, long, value_name = "ID")]
    pub segment: String,
}

/// Rejected rows are reported on stderr; the remaining rows are still analysed.
fn load_input(args: &InputArgs) -> Result<Vec<CableSegment>> {
    let parsed = load_segments_from_file(&args.input)
        .with_context(|| format!("failed to load cable list {}", args.input.display()))?;
    for rejected in &parsed.rejected {
        eprintln!(
            "rejected row {} ({}): {}",
            rejected.row, rejected.segment, rejected.reason
        );
    }
    Ok(parsed.segments)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let loaded = load_config(args.input.config.as_deref())?;
    start_logging(&loaded)?;
    let config = &loaded.config;
    let settings = config.analysis_settings()?;

    let source = args.input.input.display().to_string();
    let context = LogContext::new().with_project(settings.project.as_deref().unwrap_or(&source));
    cable_info!(
        context = context,
        "analysing {} with config {}",
        source,
        loaded
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<defaults>".to_owned())
    );

    let segments = load_input(&args.input)?;
    let output_dir = args.output.unwrap_or_else(|| config.export.output_dir.clone());
    let format = args.format.unwrap_or(config.export.format);
    let (report, written) = analyze_and_export(&segments, &settings, &output_dir, format)?;

    print_summary(&report);
    for path in written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    let summary = &report.summary;
    println!("run {} (input {})", report.run_id, &report.input_digest[..12]);
    println!(
        "roots: {} via {:?}",
        report.roots.join(", "),
        report.root_strategy
    );
    println!(
        "{} row(s): {} cable(s), {} skipped; {} path(s), {} unreachable, {} over drop limit",
        summary.input_rows,
        summary.power_segments,
        summary.skipped_rows,
        summary.paths,
        summary.unreachable_loads,
        summary.paths_over_drop_limit
    );
    println!(
        "{:<14} {:<12} {:<12} {:>9} {:>9} {:<30} {:>7} {:<10}",
        "CABLE", "FROM", "TO", "FLC (A)", "SIZE", "DESIGNATION", "VD (%)", "STATUS"
    );
    for row in &report.cable_schedule {
        let size = row
            .final_size_mm2
            .map(|s| format!("{s}"))
            .unwrap_or_else(|| "-".to_owned());
        println!(
            "{:<14} {:<12} {:<12} {:>9.1} {:>9} {:<30} {:>7.2} {:<10}",
            row.cable_id,
            row.from_bus,
            row.to_bus,
            row.full_load_current_a,
            size,
            row.designation,
            row.voltage_drop_percent,
            row.status
        );
    }
    println!(
        "approved {} / warning {} / failed {}",
        summary.approved, summary.warnings, summary.failed
    );
}

pub fn run_topology(args: TopologyArgs) -> Result<()> {
    let loaded = load_config(args.input.config.as_deref())?;
    start_logging(&loaded)?;
    let settings = loaded.config.analysis_settings()?;
    let segments = load_input(&args.input)?;
    let view = inspect_topology(&segments, &settings)?;

    println!(
        "strategy: {:?}; {} root(s): {}",
        view.resolved.strategy,
        view.resolved.roots.len(),
        view.resolved.roots.labels().collect::<Vec<_>>().join(", ")
    );
    println!(
        "{} cable(s), {} marker or blank row(s) skipped",
        view.power_segments, view.skipped_rows
    );
    for path in &view.discovery.paths {
        println!(
            "{} -> {} [{}] {:.1} m",
            path.start_bus,
            path.root_bus,
            path.segment_ids.join(" > "),
            path.total_length_m
        );
    }
    for load in &view.discovery.unreachable {
        println!("unreachable {}: {}", load.bus, load.message);
    }
    Ok(())
}

pub fn run_size(args: SizeArgs) -> Result<()> {
    let loaded = load_config(args.input.config.as_deref())?;
    start_logging(&loaded)?;
    let settings = loaded.config.analysis_settings()?;
    let segments = load_input(&args.input)?;

    let wanted = args.segment.trim();
    let (index, segment) = segments
        .iter()
        .enumerate()
        .find(|(_, s)| s.id.trim().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| anyhow!("segment '{}' not found in {}", wanted, args.input.input.display()))?;

    let result = size_segment(index, segment, &settings.sizing);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
