//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "End-to-end analysis scenarios for the sizing engine."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;

use r_cable_engine::{
    analyze, analyze_and_export,
    io::{parse_segments, InputFormat},
    model::{InstallationMethod, LoadType},
    reports::{ExportFormat, PATHS_FILE, SCHEDULE_CSV_FILE, SCHEDULE_JSON_FILE},
    tables::conductors::COPPER_SINGLE_RUN_CEILING_MM2,
    AnalysisSettings, CableSegment, CalcEngineError, RootStrategy, SizingStatus,
};
use tempfile::tempdir;

fn settings() -> AnalysisSettings {
    AnalysisSettings::default()
}

fn round_trip_chain() -> Vec<CableSegment> {
    vec![
        CableSegment::new("C-LOAD", "LOAD", "PANEL", 415.0, 45.0, 50.0),
        CableSegment::new("C-PANEL", "PANEL", "PANEL2", 415.0, 45.0, 50.0),
        CableSegment::new("C-PANEL2", "PANEL2", "TRF", 415.0, 45.0, 50.0),
    ]
}

#[test]
fn three_segment_chain_round_trip() {
    let report = analyze(&round_trip_chain(), &settings()).unwrap();

    assert_eq!(report.root_strategy, RootStrategy::ExplicitMarker);
    assert_eq!(report.paths.len(), 1);
    let path = &report.paths[0];
    assert_eq!(path.path.start_bus, "LOAD");
    assert_eq!(path.path.root_bus, "TRF");
    assert_eq!(path.path.len(), 3);
    assert!(path.path.valid);
    assert_eq!(path.path.total_length_m, 150.0);

    let sizes: Vec<f64> = path
        .path
        .segments
        .iter()
        .map(|&index| {
            report
                .sizing
                .iter()
                .find(|r| r.segment_index == index)
                .and_then(|r| r.final_size_mm2)
                .unwrap()
        })
        .collect();
    assert!(sizes.iter().all(|size| *size > 0.0));
    assert!(sizes.windows(2).all(|pair| pair[1] >= pair[0]));
    assert!(report
        .sizing
        .iter()
        .all(|r| r.status == SizingStatus::Approved));
}

#[test]
fn structural_inference_without_marker_keeps_every_load() {
    let segments: Vec<CableSegment> = (1..=50)
        .map(|i| {
            CableSegment::new(
                format!("C{i}"),
                format!("from_{i}"),
                format!("to_{i}"),
                400.0,
                7.5,
                25.0,
            )
        })
        .collect();
    let report = analyze(&segments, &settings()).unwrap();
    assert_eq!(report.root_strategy, RootStrategy::StructuralInference);
    assert_eq!(report.roots.len(), 50);
    assert_eq!(report.paths.len(), 50);
    assert!(report.unreachable.is_empty());

    let again = analyze(&segments, &settings()).unwrap();
    assert_eq!(report.roots, again.roots);
}

#[test]
fn closed_cycle_is_reported_not_hung() {
    let segments = vec![
        CableSegment::new("A", "BUS-1", "BUS-2", 415.0, 10.0, 10.0),
        CableSegment::new("B", "BUS-2", "BUS-3", 415.0, 10.0, 10.0),
        CableSegment::new("C", "BUS-3", "BUS-1", 415.0, 10.0, 10.0),
    ];
    match analyze(&segments, &settings()) {
        Err(CalcEngineError::NoRootReachable { reason }) => {
            assert!(reason.contains("cycl"), "{reason}");
        }
        other => panic!("expected structural error, got {other:?}"),
    }

    let markers_only = vec![CableSegment::new("HDR", "MCC", "MCC", 415.0, 0.0, 0.0)];
    assert!(matches!(
        analyze(&markers_only, &settings()),
        Err(CalcEngineError::EmptyTopology)
    ));
}

#[test]
fn unreachable_loads_do_not_abort_the_run() {
    let mut segments = round_trip_chain();
    segments.push(CableSegment::new("LOOP-1", "ISLAND-A", "ISLAND-B", 415.0, 5.0, 10.0));
    segments.push(CableSegment::new("LOOP-2", "ISLAND-B", "ISLAND-A", 415.0, 5.0, 10.0));
    let report = analyze(&segments, &settings()).unwrap();
    assert_eq!(report.paths.len(), 1);
    assert_eq!(report.unreachable.len(), 2);
    assert_eq!(report.summary.unreachable_loads, 2);
    assert_eq!(report.sizing.len(), 5);
    assert!(report.has_failures());
}

#[test]
fn feeder_needing_500_amps_selects_two_parallel_runs() {
    // 200 kW single-phase at 400 V, unity power factor: exactly 500 A with no derating
    let segments = vec![CableSegment::new("F-1", "MCC-1", "TRF-1", 400.0, 200.0, 20.0)
        .with_phases(1)
        .with_power_factor(1.0, 1.0)
        .with_installation(InstallationMethod::Air)];
    let report = analyze(&segments, &settings()).unwrap();
    let result = report.result_for("F-1").unwrap();
    assert_eq!(result.derating.total, 1.0);
    assert!((result.derated_current_a - 500.0).abs() < 1e-9);
    assert_eq!(result.runs, 2);
    let per_run = result.size_per_run_mm2.unwrap();
    assert!(per_run <= COPPER_SINGLE_RUN_CEILING_MM2);
    assert!(result.final_size_mm2.unwrap() > COPPER_SINGLE_RUN_CEILING_MM2);
    assert!(result.installed_rating_a / 2.0 >= result.derated_current_a / 2.0);
    assert_eq!(result.status, SizingStatus::Approved);
}

#[test]
fn invalid_segment_fails_alone() {
    let mut segments = round_trip_chain();
    segments[1].power_kw = 0.0;
    let report = analyze(&segments, &settings()).unwrap();
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.approved, 2);
    assert_eq!(report.paths[0].worst_status, SizingStatus::Failed);
}

#[test]
fn csv_input_exports_all_reports() {
    let data = "\
Cable ID,Description,From Bus,To Bus,Voltage (V),Power (kW),Length (m),Load Type,Installation
C-101,Cooling water pump,P-101,MCC-1,400,22,80,pump,tray
C-102,Process heater,H-201,MCC-1,400,60,45,heater,tray
C-201,MCC incomer,MCC-1,TRF-01,400,82,30,feeder,buried direct
MCC-1,MCC-1 header,MCC-1,MCC-1,,,,,
C-999,Unknown load,X-1,MCC-1,400,lots,10,pump,tray
";
    let parsed = parse_segments(data, InputFormat::Csv).unwrap();
    assert_eq!(parsed.rejected.len(), 1);
    assert_eq!(parsed.rejected[0].segment, "C-999");
    let segments = parsed.segments;
    assert_eq!(segments[0].load_type, Some(LoadType::Pump));

    let dir = tempdir().unwrap();
    let (report, written) =
        analyze_and_export(&segments, &settings(), dir.path(), ExportFormat::All).unwrap();
    assert_eq!(report.paths.len(), 2);
    assert_eq!(report.summary.skipped_rows, 1);
    assert_eq!(written.len(), 3);

    let paths: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(PATHS_FILE)).unwrap()).unwrap();
    assert_eq!(paths["input_digest"], report.input_digest.as_str());
    assert_eq!(paths["schema"]["title"], "PathReport");
    assert_eq!(paths["data"]["paths"].as_array().unwrap().len(), 2);

    let schedule: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join(SCHEDULE_JSON_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(schedule["data"]["cables"].as_array().unwrap().len(), 3);

    let csv_text = fs::read_to_string(dir.path().join(SCHEDULE_CSV_FILE)).unwrap();
    let mut lines = csv_text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("cable_id,description,from_bus,to_bus"));
    let columns: Vec<&str> = header.split(',').collect();
    for column in [
        "voltage_v",
        "length_m",
        "full_load_current_a",
        "derated_current_a",
        "ampacity_size_mm2",
        "running_drop_size_mm2",
        "starting_drop_size_mm2",
        "short_circuit_size_mm2",
        "final_size_mm2",
        "runs",
        "designation",
        "voltage_drop_v",
        "voltage_drop_percent",
        "status",
    ] {
        assert!(columns.contains(&column), "missing {column}");
    }
    let schema_columns = &schedule["schema"]["properties"]["cables"]["items"]["properties"];
    assert!(schema_columns["derated_current_a"].is_object());
    assert!(schema_columns["short_circuit_size_mm2"].is_object());
    assert_eq!(lines.count(), 3);
}

#[test]
fn sequential_and_parallel_runs_agree() {
    let segments: Vec<CableSegment> = (0..40)
        .map(|i| {
            CableSegment::new(format!("C{i}"), format!("LOAD-{i}"), "TRF-MAIN", 415.0, 5.0 + i as f64, 20.0 + i as f64)
        })
        .collect();
    let mut sequential = settings();
    sequential.parallel = false;
    let mut parallel = settings();
    parallel.parallel = true;
    let a = analyze(&segments, &sequential).unwrap();
    let b = analyze(&segments, &parallel).unwrap();
    assert_eq!(a.sizing, b.sizing);
    assert_eq!(a.paths, b.paths);
    assert_eq!(a.input_digest, b.input_digest);
}
