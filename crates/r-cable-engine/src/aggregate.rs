//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Combines discovered paths and sizing results into report structures."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::{CableSegment, ConductorMaterial, Insulation},
    paths::{DiscoveredPath, UnreachableLoad},
    sizing::{Constraint, SizingResult, SizingStatus},
    topology::RootStrategy,
};

/// A discovered path with voltage drop accumulated from its sized segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathReport {
    #[serde(flatten)]
    pub path: DiscoveredPath,
    /// Sum of each segment's own drop in volts.
    pub voltage_drop_v: f64,
    /// Sum of each segment's own drop percentage.
    pub voltage_drop_percent: f64,
    /// Advisory; does not affect `valid`.
    pub exceeds_voltage_drop_limit: bool,
    /// Least favourable status among the path's segments.
    pub worst_status: SizingStatus,
}

/// One row of the flat cable schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableRow {
    pub cable_id: String,
    pub description: String,
    pub from_bus: String,
    pub to_bus: String,
    pub voltage_v: f64,
    pub phases: u8,
    pub power_kw: f64,
    pub length_m: f64,
    pub material: ConductorMaterial,
    pub insulation: Insulation,
    pub cores: u8,
    pub full_load_current_a: f64,
    pub starting_current_a: Option<f64>,
    pub derating_factor: f64,
    pub derated_current_a: f64,
    pub installed_rating_a: f64,
    pub ampacity_size_mm2: Option<f64>,
    pub running_drop_size_mm2: Option<f64>,
    pub starting_drop_size_mm2: Option<f64>,
    pub short_circuit_size_mm2: Option<f64>,
    pub final_size_mm2: Option<f64>,
    pub runs: u32,
    pub size_per_run_mm2: Option<f64>,
    pub designation: String,
    pub voltage_drop_v: f64,
    pub voltage_drop_percent: f64,
    pub driving_constraint: Option<Constraint>,
    pub status: SizingStatus,
    pub remarks: String,
}

impl CableRow {
    pub fn new(segment: &CableSegment, result: &SizingResult) -> Self {
        let remarks = result
            .warnings
            .iter()
            .chain(result.notes.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            cable_id: segment.id.clone(),
            description: segment.description.clone(),
            from_bus: segment.origin_bus.trim().to_owned(),
            to_bus: segment.destination_bus.trim().to_owned(),
            voltage_v: segment.voltage_v,
            phases: segment.phases,
            power_kw: segment.power_kw,
            length_m: segment.length_m,
            material: result.material,
            insulation: result.insulation,
            cores: result.cores,
            full_load_current_a: result.full_load_current_a,
            starting_current_a: result.starting_current_a,
            derating_factor: result.derating.total,
            derated_current_a: result.derated_current_a,
            installed_rating_a: result.installed_rating_a,
            ampacity_size_mm2: result.ampacity_size_mm2,
            running_drop_size_mm2: result.running_drop_size_mm2,
            starting_drop_size_mm2: result.starting_drop_size_mm2,
            short_circuit_size_mm2: result.short_circuit_size_mm2,
            final_size_mm2: result.final_size_mm2,
            runs: result.runs,
            size_per_run_mm2: result.size_per_run_mm2,
            designation: result.designation.clone(),
            voltage_drop_v: result.voltage_drop_v,
            voltage_drop_percent: result.voltage_drop_percent,
            driving_constraint: result.driving_constraint,
            status: result.status,
            remarks,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub input_rows: usize,
    pub power_segments: usize,
    pub skipped_rows: usize,
    pub roots: usize,
    pub paths: usize,
    pub unreachable_loads: usize,
    pub paths_over_drop_limit: usize,
    pub approved: usize,
    pub warnings: usize,
    pub failed: usize,
    pub total_length_m: f64,
    pub total_load_kw: f64,
}

/// Everything one analysis run produced. Sizing and schedule rows follow input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// SHA-256 of the segment list as analysed.
    pub input_digest: String,
    pub root_strategy: RootStrategy,
    pub roots: Vec<String>,
    pub paths: Vec<PathReport>,
    pub unreachable: Vec<UnreachableLoad>,
    pub sizing: Vec<SizingResult>,
    pub cable_schedule: Vec<CableRow>,
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    pub fn result_for(&self, segment_id: &str) -> Option<&SizingResult> {
        self.sizing.iter().find(|r| r.segment_id == segment_id)
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0 || self.summary.unreachable_loads > 0
    }
}

fn severity(status: SizingStatus) -> u8 {
    match status {
        SizingStatus::Approved => 0,
        SizingStatus::Warning => 1,
        SizingStatus::Failed => 2,
    }
}

/// Attaches per-segment drops to each path. Drops add segment by segment rather than
/// being recomputed as one equivalent circuit.
pub fn path_reports(
    paths: Vec<DiscoveredPath>,
    sizing: &[SizingResult],
    drop_limit_percent: f64,
) -> Vec<PathReport> {
    let by_index: HashMap<usize, &SizingResult> =
        sizing.iter().map(|r| (r.segment_index, r)).collect();

    paths
        .into_iter()
        .map(|path| {
            let members: Vec<&SizingResult> = path
                .segments
                .iter()
                .filter_map(|index| by_index.get(index).copied())
                .collect();
            let voltage_drop_v = members.iter().map(|r| r.voltage_drop_v).sum();
            let voltage_drop_percent: f64 = members.iter().map(|r| r.voltage_drop_percent).sum();
            let worst_status = members
                .iter()
                .map(|r| r.status)
                .max_by_key(|status| severity(*status))
                .unwrap_or(SizingStatus::Approved);
            PathReport {
                path,
                voltage_drop_v,
                voltage_drop_percent,
                exceeds_voltage_drop_limit: voltage_drop_percent > drop_limit_percent,
                worst_status,
            }
        })
        .collect()
}

pub fn cable_schedule(segments: &[CableSegment], sizing: &[SizingResult]) -> Vec<CableRow> {
    sizing
        .iter()
        .filter_map(|result| {
            segments
                .get(result.segment_index)
                .map(|segment| CableRow::new(segment, result))
        })
        .collect()
}

pub fn summarize(
    input_rows: usize,
    roots: usize,
    paths: &[PathReport],
    unreachable: &[UnreachableLoad],
    sizing: &[SizingResult],
    segments: &[CableSegment],
) -> AnalysisSummary {
    let count = |status: SizingStatus| sizing.iter().filter(|r| r.status == status).count();
    let sized = || {
        sizing
            .iter()
            .filter_map(|r| segments.get(r.segment_index))
    };
    AnalysisSummary {
        input_rows,
        power_segments: sizing.len(),
        skipped_rows: input_rows.saturating_sub(sizing.len()),
        roots,
        paths: paths.len(),
        unreachable_loads: unreachable.len(),
        paths_over_drop_limit: paths.iter().filter(|p| p.exceeds_voltage_drop_limit).count(),
        approved: count(SizingStatus::Approved),
        warnings: count(SizingStatus::Warning),
        failed: count(SizingStatus::Failed),
        total_length_m: sized().map(|s| s.length_m).sum(),
        total_load_kw: sized().map(|s| s.power_kw).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::LoadType,
        sizing::{size_segment, SizingContext},
    };

    fn sized(segments: &[CableSegment]) -> Vec<SizingResult> {
        segments
            .iter()
            .enumerate()
            .map(|(i, s)| size_segment(i, s, &SizingContext::default()))
            .collect()
    }

    fn path(segments: Vec<usize>) -> DiscoveredPath {
        DiscoveredPath {
            start_bus: "M-1".into(),
            root_bus: "TRF-1".into(),
            segment_ids: segments.iter().map(|i| format!("C{i}")).collect(),
            segments,
            total_length_m: 0.0,
            total_load_kw: 0.0,
            valid: true,
        }
    }

    #[test]
    fn path_drop_is_sum_of_segment_drops() {
        let segments = vec![
            CableSegment::new("C0", "M-1", "MCC-1", 415.0, 30.0, 80.0),
            CableSegment::new("C1", "MCC-1", "TRF-1", 415.0, 30.0, 120.0),
        ];
        let sizing = sized(&segments);
        let reports = path_reports(vec![path(vec![0, 1])], &sizing, 5.0);
        let expected: f64 = sizing.iter().map(|r| r.voltage_drop_percent).sum();
        assert!((reports[0].voltage_drop_percent - expected).abs() < 1e-12);
        assert_eq!(reports[0].worst_status, SizingStatus::Approved);
    }

    #[test]
    fn drop_limit_is_advisory() {
        let segments = vec![CableSegment::new("C0", "M-1", "TRF-1", 415.0, 30.0, 80.0)];
        let sizing = sized(&segments);
        let reports = path_reports(vec![path(vec![0])], &sizing, 0.01);
        assert!(reports[0].exceeds_voltage_drop_limit);
        assert!(reports[0].path.valid);
    }

    #[test]
    fn worst_status_and_summary_counts() {
        let segments = vec![
            CableSegment::new("C0", "M-1", "MCC-1", 415.0, 0.0, 80.0),
            CableSegment::new("C1", "MCC-1", "TRF-1", 415.0, 30.0, 120.0),
        ];
        let sizing = sized(&segments);
        let reports = path_reports(vec![path(vec![0, 1])], &sizing, 5.0);
        assert_eq!(reports[0].worst_status, SizingStatus::Failed);

        let summary = summarize(3, 1, &reports, &[], &sizing, &segments);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.skipped_rows, 1);
        assert_eq!(summary.total_length_m, 200.0);
    }

    #[test]
    fn schedule_rows_carry_remarks() {
        let segments = vec![CableSegment::new("C0", " M-1 ", "TRF-1", 415.0, -1.0, 10.0)];
        let sizing = sized(&segments);
        let rows = cable_schedule(&segments, &sizing);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].from_bus, "M-1");
        assert!(rows[0].remarks.contains("power"));
        assert_eq!(rows[0].status, SizingStatus::Failed);
    }

    #[test]
    fn schedule_rows_carry_every_candidate_size() {
        let segments = vec![CableSegment::new("C1", "M-1", "TRF-1", 415.0, 11.0, 40.0)
            .with_load(LoadType::Motor)
            .with_grouping(2)];
        let sizing = sized(&segments);
        let row = &cable_schedule(&segments, &sizing)[0];
        let result = &sizing[0];
        assert_eq!(row.derated_current_a, result.derated_current_a);
        assert!(row.derated_current_a > row.full_load_current_a);
        assert_eq!(row.voltage_drop_v, result.voltage_drop_v);
        assert!(row.voltage_drop_v > 0.0);
        assert_eq!(row.ampacity_size_mm2, result.ampacity_size_mm2);
        assert_eq!(row.running_drop_size_mm2, result.running_drop_size_mm2);
        assert!(row.starting_drop_size_mm2.is_some());
        assert_eq!(row.short_circuit_size_mm2, None);
        assert_eq!(row.final_size_mm2, result.final_size_mm2);
    }
}
