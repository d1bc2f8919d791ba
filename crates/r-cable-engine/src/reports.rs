//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "JSON and CSV export of path and cable schedule reports."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{Display, EnumString};
use tracing::info;

use crate::{aggregate::AnalysisReport, errors::Result};

pub const PATHS_FILE: &str = "paths.json";
pub const SCHEDULE_JSON_FILE: &str = "cable_schedule.json";
pub const SCHEDULE_CSV_FILE: &str = "cable_schedule.csv";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Json,
    Csv,
    #[default]
    All,
}

impl ExportFormat {
    fn json(&self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::All)
    }

    fn csv(&self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::All)
    }
}

#[derive(Debug)]
pub struct ReportExporter<'a> {
    report: &'a AnalysisReport,
}

impl<'a> ReportExporter<'a> {
    pub fn new(report: &'a AnalysisReport) -> Self {
        Self { report }
    }

    /// Writes the selected report files and returns their paths.
    pub fn export(&self, output_dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let timestamp = self.report.timestamp.to_rfc3339();
        let mut written = Vec::new();

        if format.json() {
            let paths_payload = PathsPayload {
                root_strategy: &self.report.root_strategy,
                roots: &self.report.roots,
                paths: &self.report.paths,
                unreachable: &self.report.unreachable,
            };
            let schedule_payload = SchedulePayload {
                summary: &self.report.summary,
                cables: &self.report.cable_schedule,
                sizing: &self.report.sizing,
            };
            let paths =
                ReportEnvelope::new(&timestamp, self.report, paths_schema(), &paths_payload);
            let schedule = ReportEnvelope::new(
                &timestamp,
                self.report,
                schedule_schema(),
                &schedule_payload,
            );
            written.push(write_json(output_dir.join(PATHS_FILE), &paths)?);
            written.push(write_json(output_dir.join(SCHEDULE_JSON_FILE), &schedule)?);
        }
        if format.csv() {
            written.push(self.write_schedule_csv(output_dir.join(SCHEDULE_CSV_FILE))?);
        }

        info!(
            run_id = %self.report.run_id,
            files = written.len(),
            "reports exported to {}",
            output_dir.display()
        );
        Ok(written)
    }

    fn write_schedule_csv(&self, path: PathBuf) -> Result<PathBuf> {
        let mut writer = csv::Writer::from_path(&path)?;
        for row in &self.report.cable_schedule {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    timestamp: &'a str,
    run_id: String,
    input_digest: &'a str,
    engine_version: &'static str,
    schema: serde_json::Value,
    data: &'a T,
}

impl<'a, T: Serialize> ReportEnvelope<'a, T> {
    fn new(
        timestamp: &'a str,
        report: &'a AnalysisReport,
        schema: serde_json::Value,
        data: &'a T,
    ) -> Self {
        Self {
            timestamp,
            run_id: report.run_id.to_string(),
            input_digest: &report.input_digest,
            engine_version: crate::VERSION,
            schema,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
struct PathsPayload<'a> {
    root_strategy: &'a crate::topology::RootStrategy,
    roots: &'a [String],
    paths: &'a [crate::aggregate::PathReport],
    unreachable: &'a [crate::paths::UnreachableLoad],
}

#[derive(Debug, Serialize)]
struct SchedulePayload<'a> {
    summary: &'a crate::aggregate::AnalysisSummary,
    cables: &'a [crate::aggregate::CableRow],
    sizing: &'a [crate::sizing::SizingResult],
}

fn write_json<T: Serialize>(path: PathBuf, value: &T) -> Result<PathBuf> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(&path, serialized)?;
    Ok(path)
}

fn paths_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "PathReport",
        "type": "object",
        "properties": {
            "root_strategy": {"enum": ["explicit-marker", "structural-inference"]},
            "roots": {"type": "array", "items": {"type": "string"}},
            "paths": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "start_bus": {"type": "string"},
                        "root_bus": {"type": "string"},
                        "segments": {"type": "array", "items": {"type": "integer"}},
                        "segment_ids": {"type": "array", "items": {"type": "string"}},
                        "total_length_m": {"type": "number"},
                        "total_load_kw": {"type": "number"},
                        "valid": {"type": "boolean"},
                        "voltage_drop_v": {"type": "number"},
                        "voltage_drop_percent": {"type": "number"},
                        "exceeds_voltage_drop_limit": {"type": "boolean"},
                        "worst_status": {"enum": ["APPROVED", "WARNING", "FAILED"]}
                    },
                    "required": ["start_bus", "root_bus", "segment_ids", "valid"]
                }
            },
            "unreachable": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "bus": {"type": "string"},
                        "reason": {"enum": ["no-outgoing-segment", "frontier-exhausted"]},
                        "explored_buses": {"type": "integer"},
                        "message": {"type": "string"}
                    },
                    "required": ["bus", "reason", "message"]
                }
            }
        },
        "required": ["root_strategy", "roots", "paths", "unreachable"]
    })
}

fn schedule_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CableSchedule",
        "type": "object",
        "properties": {
            "summary": {"type": "object"},
            "cables": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "cable_id": {"type": "string"},
                        "from_bus": {"type": "string"},
                        "to_bus": {"type": "string"},
                        "voltage_v": {"type": "number"},
                        "length_m": {"type": "number"},
                        "full_load_current_a": {"type": "number"},
                        "derating_factor": {"type": "number"},
                        "derated_current_a": {"type": "number"},
                        "ampacity_size_mm2": {"type": ["number", "null"]},
                        "running_drop_size_mm2": {"type": ["number", "null"]},
                        "starting_drop_size_mm2": {"type": ["number", "null"]},
                        "short_circuit_size_mm2": {"type": ["number", "null"]},
                        "final_size_mm2": {"type": ["number", "null"]},
                        "runs": {"type": "integer"},
                        "designation": {"type": "string"},
                        "voltage_drop_v": {"type": "number"},
                        "voltage_drop_percent": {"type": "number"},
                        "status": {"enum": ["APPROVED", "WARNING", "FAILED"]},
                        "remarks": {"type": "string"}
                    },
                    "required": ["cable_id", "from_bus", "to_bus", "designation", "status"]
                }
            },
            "sizing": {"type": "array", "items": {"type": "object"}}
        },
        "required": ["summary", "cables", "sizing"]
    })
}
