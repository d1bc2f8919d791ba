//! ---
//! ems_section: "15-testing-qa-runbook"
//! ems_subsection: "integration-tests"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "End-to-end import, analysis and export scenarios."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use r_cable_common::AppConfig;
use r_cable_engine::{
    analyze, analyze_and_export,
    io::load_segments_from_file,
    reports::{ExportFormat, SCHEDULE_CSV_FILE},
    AnalysisSettings, RootStrategy, SizingStatus,
};

fn fixture(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(path)
}

fn fixture_settings() -> AnalysisSettings {
    AppConfig::from_path(&fixture("r-cable.toml"))
        .and_then(|config| config.analysis_settings())
        .unwrap_or_else(|err| panic!("fixture config invalid: {err:#}"))
}

#[test]
fn csv_plant_is_traced_to_the_transformer() {
    let parsed = load_segments_from_file(fixture("plant.csv")).unwrap();
    assert!(parsed.rejected.is_empty(), "{:?}", parsed.rejected);
    let segments = parsed.segments;
    assert_eq!(segments.len(), 10);

    let report = analyze(&segments, &fixture_settings()).unwrap();
    assert_eq!(report.root_strategy, RootStrategy::ExplicitMarker);
    assert_eq!(report.roots, ["TRF-01"]);
    assert_eq!(report.summary.power_segments, 7);
    assert_eq!(report.summary.skipped_rows, 3);
    assert!(report.unreachable.is_empty());

    let starts: HashSet<&str> = report
        .paths
        .iter()
        .map(|p| p.path.start_bus.as_str())
        .collect();
    let expected: HashSet<&str> = ["P-101A", "P-101B", "F-201", "H-301", "LP-1"].into();
    assert_eq!(starts, expected);
    for path in &report.paths {
        assert_eq!(path.path.len(), 3, "{:?}", path.path.segment_ids);
        assert_eq!(path.path.segment_ids[1..], ["C-201", "C-301"]);
        assert!(path.path.valid);
    }
}

#[test]
fn every_power_segment_gets_a_schedule_row() {
    let segments = load_segments_from_file(fixture("plant.csv")).unwrap().segments;
    let report = analyze(&segments, &fixture_settings()).unwrap();

    let ids: Vec<&str> = report
        .cable_schedule
        .iter()
        .map(|row| row.cable_id.as_str())
        .collect();
    assert_eq!(
        ids,
        ["C-101", "C-102", "C-103", "C-104", "C-105", "C-201", "C-301"]
    );
    for row in &report.cable_schedule {
        match row.status {
            SizingStatus::Failed => assert!(!row.remarks.is_empty(), "{}", row.cable_id),
            _ => {
                assert!(row.final_size_mm2.unwrap_or(0.0) > 0.0, "{}", row.cable_id);
                assert!(row.runs >= 1);
                assert!(!row.designation.is_empty());
            }
        }
    }

    let lighting = report.result_for("C-105").unwrap();
    assert_eq!(lighting.status, SizingStatus::Approved);
    let heater = report.result_for("C-104").unwrap();
    assert!(heater.starting_current_a.is_none());
    let pump = report.result_for("C-101").unwrap();
    assert!(pump.starting_current_a.unwrap() > pump.full_load_current_a);
}

#[test]
fn yaml_plant_without_transformer_is_inferred() {
    let segments = load_segments_from_file(fixture("plant.yaml")).unwrap().segments;
    let report = analyze(&segments, &AnalysisSettings::default()).unwrap();
    assert_eq!(report.root_strategy, RootStrategy::StructuralInference);
    assert_eq!(report.roots, ["MAIN-SWGR"]);
    assert_eq!(report.paths.len(), 2);

    let configured = analyze(&segments, &fixture_settings()).unwrap();
    assert_eq!(configured.root_strategy, RootStrategy::ExplicitMarker);
    assert_eq!(configured.roots, report.roots);
    assert_eq!(configured.input_digest, report.input_digest);
}

#[test]
fn exported_csv_schedule_matches_report() {
    let segments = load_segments_from_file(fixture("plant.csv")).unwrap().segments;
    let dir = tempfile::tempdir().unwrap();
    let (report, written) = analyze_and_export(
        &segments,
        &fixture_settings(),
        &dir.path().join("nested/out"),
        ExportFormat::Csv,
    )
    .unwrap();
    assert_eq!(written.len(), 1);

    let mut reader = csv::Reader::from_path(dir.path().join("nested/out").join(SCHEDULE_CSV_FILE))
        .unwrap();
    let headers = reader.headers().unwrap().clone();
    let status_col = headers.iter().position(|h| h == "status").unwrap();
    let id_col = headers.iter().position(|h| h == "cable_id").unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), report.cable_schedule.len());
    for (row, expected) in rows.iter().zip(&report.cable_schedule) {
        assert_eq!(&row[id_col], expected.cable_id);
        assert_eq!(&row[status_col], expected.status.to_string());
    }
}

#[test]
fn json_reports_are_keyed_by_input_digest() {
    let segments = load_segments_from_file(fixture("plant.csv")).unwrap().segments;
    let dir = tempfile::tempdir().unwrap();
    let (first, _) =
        analyze_and_export(&segments, &fixture_settings(), dir.path(), ExportFormat::Json).unwrap();
    let (second, _) =
        analyze_and_export(&segments, &fixture_settings(), dir.path(), ExportFormat::Json).unwrap();
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.input_digest, second.input_digest);

    let envelope: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("cable_schedule.json")).unwrap())
            .unwrap();
    assert_eq!(envelope["run_id"], second.run_id.to_string());
    assert_eq!(envelope["schema"]["title"], "CableSchedule");
    assert_eq!(
        envelope["data"]["summary"]["power_segments"],
        second.summary.power_segments
    );
}
