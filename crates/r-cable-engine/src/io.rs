//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Loads cable lists from JSON, YAML and CSV and normalizes loose column names."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::{fs, path::Path, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    errors::{CalcEngineError, Result},
    model::CableSegment,
};

type Record = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(InputFormat::Json),
            "yaml" | "yml" => Ok(InputFormat::Yaml),
            "csv" => Ok(InputFormat::Csv),
            other => Err(CalcEngineError::UnsupportedFormat(format!(
                "{} (extension '{}')",
                path.display(),
                other
            ))),
        }
    }
}

/// A record that could not be normalized into a [`CableSegment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based position among the data records.
    pub row: usize,
    /// Cable identifier, or `row N` when the record has none.
    pub segment: String,
    pub reason: String,
}

/// Segments read from one cable list. A bad record lands in `rejected` and does not
/// stop the remaining rows from loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSegments {
    pub segments: Vec<CableSegment>,
    pub rejected: Vec<RejectedRow>,
}

pub fn load_segments_from_file(path: impl AsRef<Path>) -> Result<ParsedSegments> {
    let path = path.as_ref();
    let format = InputFormat::from_path(path)?;
    let data = fs::read_to_string(path)?;
    let parsed = parse_segments(&data, format)?;
    info!(
        path = %path.display(),
        rows = parsed.segments.len(),
        rejected = parsed.rejected.len(),
        ?format,
        "cable list loaded"
    );
    Ok(parsed)
}

/// Unreadable documents are errors; unusable records are collected as [`RejectedRow`]s.
pub fn parse_segments(data: &str, format: InputFormat) -> Result<ParsedSegments> {
    let records = match format {
        InputFormat::Json => records_from_value(serde_json::from_str(data)?)?,
        InputFormat::Yaml => records_from_value(serde_yaml::from_str(data)?)?,
        InputFormat::Csv => records_from_csv(data)?.into_iter().map(Some).collect(),
    };

    let mut parsed = ParsedSegments::default();
    for (position, record) in records.iter().enumerate() {
        let row = position + 1;
        let outcome = match record {
            Some(record) => segment_from_record(row, record),
            None => Err(CalcEngineError::InvalidSegment {
                segment: format!("row {row}"),
                reason: "record is not an object".into(),
            }),
        };
        match outcome {
            Ok(segment) => parsed.segments.push(segment),
            Err(CalcEngineError::InvalidSegment { segment, reason }) => {
                warn!(row, segment = %segment, "cable record rejected: {}", reason);
                parsed.rejected.push(RejectedRow {
                    row,
                    segment,
                    reason,
                });
            }
            Err(other) => return Err(other),
        }
    }
    Ok(parsed)
}

/// Accepts a bare array of records or an object holding one under `segments` or `cables`.
/// Entries that are not objects come back as `None`.
fn records_from_value(value: Value) -> Result<Vec<Option<Record>>> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("segments").or_else(|| map.remove("cables")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CalcEngineError::UnsupportedFormat(
                    "expected an array of cable records or a 'segments' list".into(),
                ))
            }
        },
        _ => {
            return Err(CalcEngineError::UnsupportedFormat(
                "expected an array of cable records".into(),
            ))
        }
    };
    Ok(list
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        })
        .collect())
}

fn records_from_csv(data: &str) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let record = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_owned(), Value::String(cell.to_owned())))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Lower-case, unit parentheses dropped, separators folded to `_`: `"Length (m)"` -> `length_m`.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        match ch {
            '(' | ')' | '[' | ']' => {}
            ' ' | '-' | '.' | '/' | '_' => {
                if !key.is_empty() && !key.ends_with('_') {
                    key.push('_');
                }
            }
            other => key.extend(other.to_lowercase()),
        }
    }
    key.trim_end_matches('_').to_owned()
}

const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("id", &["id", "cable_id", "cable_tag", "tag", "cable_no", "cable"]),
    ("description", &["description", "desc", "service", "name"]),
    (
        "origin_bus",
        &["from", "from_bus", "origin", "origin_bus", "source_bus", "load_bus"],
    ),
    (
        "destination_bus",
        &["to", "to_bus", "destination", "destination_bus", "supply_bus", "feeder_bus"],
    ),
    ("voltage_v", &["voltage", "voltage_v", "v", "system_voltage"]),
    ("phases", &["phases", "phase", "no_of_phases"]),
    ("power_kw", &["kw", "power_kw", "power", "load_kw", "rated_power_kw"]),
    ("length_m", &["length", "length_m", "route_length", "route_length_m"]),
    ("material", &["material", "conductor", "conductor_material"]),
    ("insulation", &["insulation", "insulation_type"]),
    ("cores", &["cores", "core", "no_of_cores", "core_count"]),
    (
        "installation",
        &["installation", "installation_method", "laying", "method"],
    ),
    (
        "ambient_temp_c",
        &[
            "ambient",
            "ambient_temp",
            "ambient_temp_c",
            "ambient_temperature",
            "ambient_temperature_c",
        ],
    ),
    (
        "soil_resistivity_km_w",
        &[
            "soil_resistivity",
            "soil_resistivity_km_w",
            "soil_thermal_resistivity",
        ],
    ),
    ("burial_depth_m", &["depth", "depth_m", "burial_depth", "burial_depth_m"]),
    (
        "grouped_circuits",
        &["grouped_circuits", "grouping", "circuits", "no_of_circuits"],
    ),
    ("load_type", &["load_type", "type", "load"]),
    ("efficiency", &["efficiency", "eff"]),
    ("power_factor", &["power_factor", "pf", "cos_phi"]),
    ("starting_method", &["starting_method", "starter", "start_method"]),
    (
        "protective_device",
        &["protective_device", "protection", "device", "breaker_type"],
    ),
    (
        "short_circuit_ka",
        &["short_circuit_ka", "isc_ka", "isc", "fault_level_ka", "sc_ka"],
    ),
    ("clearing_time_s", &["clearing_time", "clearing_time_s", "trip_time"]),
];

fn canonical_field(key: &str) -> Option<&'static str> {
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&key))
        .map(|(field, _)| *field)
}

struct RecordView<'r> {
    row: usize,
    fields: IndexMap<&'static str, &'r Value>,
}

impl<'r> RecordView<'r> {
    fn new(row: usize, record: &'r Record) -> Self {
        let mut fields = IndexMap::new();
        for (raw, value) in record {
            let key = normalize_key(raw);
            match canonical_field(&key) {
                Some(field) => {
                    fields.entry(field).or_insert(value);
                }
                None => debug!(row, column = %raw, "unrecognised column ignored"),
            }
        }
        Self { row, fields }
    }

    fn label(&self) -> String {
        self.text("id")
            .unwrap_or_else(|| format!("row {}", self.row))
    }

    fn invalid(&self, reason: String) -> CalcEngineError {
        CalcEngineError::InvalidSegment {
            segment: self.label(),
            reason,
        }
    }

    fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn number(&self, field: &str) -> Result<Option<f64>> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.invalid(format!("{field} '{s}' is not a number"))),
            Some(other) => Err(self.invalid(format!("{field} has unexpected value {other}"))),
        }
    }

    fn count<T: TryFrom<u64>>(&self, field: &str) -> Result<Option<T>> {
        let raw = match self.fields.get(field) {
            Some(Value::String(s)) => s.trim().trim_end_matches(['c', 'C']).to_owned(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Ok(None),
        };
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<u64>()
            .ok()
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| self.invalid(format!("{field} '{raw}' is not a whole number")))
    }

    fn choice<T: FromStr>(&self, field: &str) -> Result<Option<T>> {
        let Some(raw) = self.text(field) else {
            return Ok(None);
        };
        let folded: String = raw
            .chars()
            .map(|c| if c == ' ' || c == '_' { '-' } else { c })
            .collect();
        T::from_str(&folded)
            .map(Some)
            .map_err(|_| self.invalid(format!("unknown {field} '{raw}'")))
    }
}

fn segment_from_record(row: usize, record: &Record) -> Result<CableSegment> {
    let view = RecordView::new(row, record);
    let id = view
        .text("id")
        .ok_or_else(|| view.invalid("missing cable identifier".into()))?;
    for field in ["origin_bus", "destination_bus"] {
        if !view.has(field) {
            return Err(view.invalid(format!("missing {field}")));
        }
    }

    let mut segment = CableSegment::new(
        id,
        view.text("origin_bus").unwrap_or_default(),
        view.text("destination_bus").unwrap_or_default(),
        view.number("voltage_v")?.unwrap_or(0.0),
        view.number("power_kw")?.unwrap_or(0.0),
        view.number("length_m")?.unwrap_or(0.0),
    );
    segment.description = view.text("description").unwrap_or_default();
    if let Some(phases) = view.count("phases")? {
        segment.phases = phases;
    }
    segment.material = view.choice("material")?;
    segment.insulation = view.choice("insulation")?;
    segment.cores = view.count("cores")?;
    segment.installation = view.choice("installation")?;
    segment.ambient_temp_c = view.number("ambient_temp_c")?;
    segment.soil_resistivity_km_w = view.number("soil_resistivity_km_w")?;
    segment.burial_depth_m = view.number("burial_depth_m")?;
    segment.grouped_circuits = view.count("grouped_circuits")?;
    segment.load_type = view.choice("load_type")?;
    segment.efficiency = view.number("efficiency")?;
    segment.power_factor = view.number("power_factor")?;
    segment.starting_method = view.choice("starting_method")?;
    segment.protective_device = view.choice("protective_device")?;
    segment.short_circuit_ka = view.number("short_circuit_ka")?;
    segment.clearing_time_s = view.number("clearing_time_s")?;
    Ok(segment)
}
