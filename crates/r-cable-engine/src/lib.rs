//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Topology inference, path discovery and constraint-based cable sizing."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Topology and constraint sizing engine.
//!
//! [`analyze`] runs the whole pipeline over a flat cable list: root detection,
//! path discovery, per-segment sizing and aggregation. Structural failures (no
//! root can be derived) are the only errors; everything else is reported per
//! item inside the returned [`AnalysisReport`].

pub mod aggregate;
pub mod errors;
pub mod interpolate;
pub mod io;
pub mod model;
pub mod paths;
pub mod reports;
pub mod sizing;
pub mod tables;
pub mod topology;

use std::path::{Path, PathBuf};

use chrono::Utc;
use r_cable_logging::{cable_info, log_run_event, LogContext, RunOutcome};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::{
    aggregate::{cable_schedule, path_reports, summarize},
    paths::{discover_paths, PathDiscovery},
    reports::{ExportFormat, ReportExporter},
    sizing::size_segments,
    topology::{detect_roots, ResolvedRoots, SegmentGraph},
};

pub use aggregate::{AnalysisReport, AnalysisSummary, CableRow, PathReport};
pub use errors::{CalcEngineError, Result};
pub use model::{CableSegment, SegmentDefaults};
pub use paths::{DiscoveredPath, PathTieBreak, UnreachableLoad};
pub use sizing::{SizingContext, SizingResult, SizingStatus};
pub use topology::{RootSet, RootStrategy};

/// Engine crate version, stamped into exported reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Root marker matched against destination bus names when none is configured.
pub const DEFAULT_ROOT_MARKER: &str = "TRF";

/// Advisory limit for the summed drop along a path (%).
pub const DEFAULT_PATH_DROP_LIMIT_PERCENT: f64 = 5.0;

/// Run-level knobs. [`Default`] matches the documented engine defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Substrings that mark a destination bus as a root (case-insensitive).
    pub root_markers: Vec<String>,
    pub tie_break: PathTieBreak,
    pub path_voltage_drop_limit_percent: f64,
    /// Fan path tracing and sizing out across threads.
    pub parallel: bool,
    pub sizing: SizingContext,
    /// Label carried in log context.
    pub project: Option<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            root_markers: vec![DEFAULT_ROOT_MARKER.to_owned()],
            tie_break: PathTieBreak::default(),
            path_voltage_drop_limit_percent: DEFAULT_PATH_DROP_LIMIT_PERCENT,
            parallel: cfg!(feature = "parallel"),
            sizing: SizingContext::default(),
            project: None,
        }
    }
}

/// Roots and paths without sizing; used for topology inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyView {
    pub resolved: ResolvedRoots,
    pub discovery: PathDiscovery,
    pub power_segments: usize,
    pub skipped_rows: usize,
}

/// SHA-256 over the JSON encoding of the segment list.
pub fn input_digest(segments: &[CableSegment]) -> Result<String> {
    let encoded = serde_json::to_vec(segments)?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(format!("{:x}", hasher.finalize()))
}

fn resolve_roots(
    graph: &SegmentGraph<'_>,
    settings: &AnalysisSettings,
    context: &LogContext<'_>,
) -> Result<ResolvedRoots> {
    detect_roots(graph, &settings.root_markers)
        .into_result()
        .inspect_err(|err| {
            log_run_event(
                Some(context),
                "analysis.roots",
                &err.to_string(),
                RunOutcome::Aborted,
            )
        })
}

pub fn inspect_topology(
    segments: &[CableSegment],
    settings: &AnalysisSettings,
) -> Result<TopologyView> {
    let context = LogContext::new();
    let graph = SegmentGraph::build(segments);
    let resolved = resolve_roots(&graph, settings, &context)?;
    let discovery = discover_paths(&graph, &resolved.roots, settings.tie_break, settings.parallel);
    Ok(TopologyView {
        resolved,
        discovery,
        power_segments: graph.power_segment_count(),
        skipped_rows: graph.skipped_rows(),
    })
}

/// Runs root detection, path discovery, sizing and aggregation.
///
/// Fails only when no root bus can be derived from the edge list.
pub fn analyze(segments: &[CableSegment], settings: &AnalysisSettings) -> Result<AnalysisReport> {
    let run_id = Uuid::new_v4();
    let run = run_id.to_string();
    let mut context = LogContext::new().with_run(&run);
    if let Some(project) = settings.project.as_deref() {
        context = context.with_project(project);
    }

    let input_digest = input_digest(segments)?;
    cable_info!(
        context = context,
        "analysing {} row(s), digest {}",
        segments.len(),
        &input_digest[..12]
    );

    let graph = SegmentGraph::build(segments);
    let resolved = resolve_roots(&graph, settings, &context)?;
    let discovery = discover_paths(&graph, &resolved.roots, settings.tie_break, settings.parallel);

    info!(segments = graph.power_segment_count(), parallel = settings.parallel, "sizing segments");
    let sizing = size_segments(segments, &settings.sizing, settings.parallel);

    let paths = path_reports(
        discovery.paths,
        &sizing,
        settings.path_voltage_drop_limit_percent,
    );
    let schedule = cable_schedule(segments, &sizing);
    let summary = summarize(
        segments.len(),
        resolved.roots.len(),
        &paths,
        &discovery.unreachable,
        &sizing,
        segments,
    );

    let outcome = if summary.failed + summary.warnings + summary.unreachable_loads > 0 {
        RunOutcome::Degraded
    } else {
        RunOutcome::Completed
    };
    log_run_event(
        Some(&context),
        "analysis.complete",
        &format!(
            "{} path(s), {} unreachable, {} approved / {} warning / {} failed",
            summary.paths,
            summary.unreachable_loads,
            summary.approved,
            summary.warnings,
            summary.failed
        ),
        outcome,
    );

    Ok(AnalysisReport {
        run_id,
        timestamp: Utc::now(),
        input_digest,
        root_strategy: resolved.strategy,
        roots: resolved.roots.labels().map(str::to_owned).collect(),
        paths,
        unreachable: discovery.unreachable,
        sizing,
        cable_schedule: schedule,
        summary,
    })
}

/// [`analyze`] followed by report export into `output_dir`.
pub fn analyze_and_export(
    segments: &[CableSegment],
    settings: &AnalysisSettings,
    output_dir: &Path,
    format: ExportFormat,
) -> Result<(AnalysisReport, Vec<PathBuf>)> {
    let report = analyze(segments, settings)?;
    let written = ReportExporter::new(&report).export(output_dir, format)?;
    Ok((report, written))
}
