//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Per-segment conductor sizing against ampacity, voltage drop and fault withstand."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Conductor sizing.
//!
//! Each power-carrying segment is sized independently: the resolver computes the
//! design current, derates the catalog, and searches the ascending size catalog
//! once per constraint. The governing size is the largest candidate; copper above
//! the single-run ceiling may then be split into two parallel runs.

pub mod ampacity;
pub mod current;
pub mod derating;
pub mod selection;
pub mod short_circuit;
pub mod voltage_drop;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;
use r_cable_logging::{cable_warn, LogContext};
use tracing::debug;

use crate::{
    model::{
        CableSegment, ConductorMaterial, InstallationMethod, Insulation, LoadType,
        SegmentDefaults, StartingMethod,
    },
    tables::{
        loads::{default_clearing_time, load_profile, starting_profile, StartingProfile},
        CatalogIndex,
    },
};

pub use derating::DeratingBreakdown;
pub use selection::Constraint;
pub use short_circuit::FaultDuty;
pub use voltage_drop::VoltageDrop;

use self::{
    ampacity::{installed_rating, segment_rating, size_for_current},
    derating::{derating_factors, InstallationConditions},
    selection::{designation, plan_runs, Candidates, RunDemand, StartingDemand},
    short_circuit::size_for_withstand,
    voltage_drop::{size_for_drop, voltage_drop},
};

/// Outcome of a catalog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSearch {
    Within(CatalogIndex),
    /// No size satisfies the check; carries the largest size.
    Exceeded(CatalogIndex),
}

impl SizeSearch {
    pub fn index(&self) -> CatalogIndex {
        match self {
            SizeSearch::Within(idx) | SizeSearch::Exceeded(idx) => *idx,
        }
    }

    pub fn is_exceeded(&self) -> bool {
        matches!(self, SizeSearch::Exceeded(_))
    }
}

/// First ascending catalog entry accepted by `accept`.
pub(crate) fn first_size(accept: impl Fn(CatalogIndex) -> bool) -> SizeSearch {
    CatalogIndex::ascending()
        .find(|idx| accept(*idx))
        .map(SizeSearch::Within)
        .unwrap_or(SizeSearch::Exceeded(CatalogIndex::LARGEST))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SizingStatus {
    Approved,
    Warning,
    Failed,
}

/// Project-wide inputs the resolver needs beyond the segment itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizingContext {
    pub defaults: SegmentDefaults,
    /// Replaces the load-type running drop limit (%).
    pub running_limit_overrides: IndexMap<LoadType, f64>,
}

impl SizingContext {
    pub fn running_limit(&self, load_type: LoadType) -> f64 {
        self.running_limit_overrides
            .get(&load_type)
            .copied()
            .unwrap_or(load_profile(load_type).running_drop_limit_percent)
    }
}

/// Motor starting data for motor-driven loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartingConditions {
    pub method: StartingMethod,
    pub profile: StartingProfile,
}

/// A segment with every optional attribute replaced by its effective value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSegment {
    pub voltage_v: f64,
    pub phases: u8,
    pub power_kw: f64,
    pub length_m: f64,
    pub material: ConductorMaterial,
    pub insulation: Insulation,
    pub cores: u8,
    pub installation: InstallationMethod,
    pub ambient_temp_c: f64,
    pub grouped_circuits: u32,
    pub soil_resistivity_km_w: f64,
    pub burial_depth_m: f64,
    pub load_type: LoadType,
    pub power_factor: f64,
    pub efficiency: f64,
    pub running_limit_percent: f64,
    pub starting: Option<StartingConditions>,
    pub fault_duty: Option<FaultDuty>,
}

impl ResolvedSegment {
    pub fn conditions(&self) -> InstallationConditions {
        InstallationConditions {
            installation: self.installation,
            insulation: self.insulation,
            ambient_temp_c: self.ambient_temp_c,
            grouped_circuits: self.grouped_circuits,
            soil_resistivity_km_w: self.soil_resistivity_km_w,
            burial_depth_m: self.burial_depth_m,
        }
    }

    /// Power factor during starting; VFDs keep the running value.
    pub fn starting_power_factor(&self) -> Option<f64> {
        self.starting
            .map(|s| s.profile.power_factor.unwrap_or(self.power_factor))
    }
}

/// Applies defaults to optional attributes. Returns informational notes for inputs that were ignored.
pub fn resolve(segment: &CableSegment, context: &SizingContext) -> (ResolvedSegment, Vec<String>) {
    let defaults = &context.defaults;
    let mut notes = Vec::new();

    let installation = segment.installation.unwrap_or(defaults.installation);
    let load_type = segment.load_type.unwrap_or(defaults.load_type);
    let profile = load_profile(load_type);
    let ambient_default = if installation.is_buried() {
        defaults.ambient_ground_c
    } else {
        defaults.ambient_air_c
    };

    let starting = if load_type.is_motor_driven() {
        let method = segment.starting_method.unwrap_or(defaults.starting_method);
        Some(StartingConditions {
            method,
            profile: starting_profile(method),
        })
    } else {
        if let Some(method) = segment.starting_method {
            notes.push(format!(
                "starting method {method} ignored for non-motor load '{load_type}'"
            ));
        }
        None
    };

    let fault_duty = match segment.short_circuit_ka {
        Some(current_ka) => {
            let clearing_time = segment
                .clearing_time_s
                .or_else(|| segment.protective_device.map(default_clearing_time));
            match clearing_time {
                Some(clearing_time_s) => Some(FaultDuty {
                    current_ka,
                    clearing_time_s,
                }),
                None => {
                    notes.push(
                        "short-circuit current given without protective device or clearing time; withstand check skipped"
                            .into(),
                    );
                    None
                }
            }
        }
        None => None,
    };

    let resolved = ResolvedSegment {
        voltage_v: segment.voltage_v,
        phases: segment.phases,
        power_kw: segment.power_kw,
        length_m: segment.length_m,
        material: segment.material.unwrap_or(defaults.material),
        insulation: segment.insulation.unwrap_or(defaults.insulation),
        cores: segment.cores.unwrap_or(defaults.cores),
        installation,
        ambient_temp_c: segment.ambient_temp_c.unwrap_or(ambient_default),
        grouped_circuits: segment.grouped_circuits.unwrap_or(defaults.grouped_circuits),
        soil_resistivity_km_w: segment
            .soil_resistivity_km_w
            .unwrap_or(defaults.soil_resistivity_km_w),
        burial_depth_m: segment.burial_depth_m.unwrap_or(defaults.burial_depth_m),
        load_type,
        power_factor: segment.power_factor.unwrap_or(profile.power_factor),
        efficiency: segment.efficiency.unwrap_or(profile.efficiency),
        running_limit_percent: context.running_limit(load_type),
        starting,
        fault_duty,
    };
    (resolved, notes)
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn unit_fraction(value: Option<f64>) -> bool {
    value.map_or(true, |v| v.is_finite() && v > 0.0 && v <= 1.0)
}

/// Reasons a segment cannot be sized at all. Empty when the segment is sizeable.
pub fn validate(segment: &CableSegment) -> Vec<String> {
    let mut reasons = Vec::new();
    if !segment.has_buses() {
        reasons.push("origin and destination bus are required".to_string());
    }
    if !positive(segment.voltage_v) {
        reasons.push(format!("voltage {} V must be positive", segment.voltage_v));
    }
    if !positive(segment.power_kw) {
        reasons.push(format!("power {} kW must be positive", segment.power_kw));
    }
    if !positive(segment.length_m) {
        reasons.push(format!("length {} m must be positive", segment.length_m));
    }
    if !matches!(segment.phases, 1 | 3) {
        reasons.push(format!("phases must be 1 or 3, got {}", segment.phases));
    }
    if !unit_fraction(segment.power_factor) {
        reasons.push("power factor must lie in (0, 1]".to_string());
    }
    if !unit_fraction(segment.efficiency) {
        reasons.push("efficiency must lie in (0, 1]".to_string());
    }
    if segment.cores == Some(0) {
        reasons.push("core count must be at least 1".to_string());
    }
    if segment.short_circuit_ka.is_some_and(|ka| !positive(ka)) {
        reasons.push("short-circuit current must be positive".to_string());
    }
    if segment.clearing_time_s.is_some_and(|t| !positive(t)) {
        reasons.push("clearing time must be positive".to_string());
    }
    reasons
}

/// Sizing outcome for one segment. Sizes are cross sections in mm².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    pub segment_id: String,
    pub segment_index: usize,
    pub material: ConductorMaterial,
    pub insulation: Insulation,
    pub cores: u8,
    pub full_load_current_a: f64,
    pub starting_current_a: Option<f64>,
    pub derating: DeratingBreakdown,
    /// Catalog rating of one run before derating.
    pub catalog_rating_a: f64,
    /// Derated rating of all runs together.
    pub installed_rating_a: f64,
    /// Full-load current divided by the total derating factor.
    pub derated_current_a: f64,
    pub ampacity_size_mm2: Option<f64>,
    pub running_drop_size_mm2: Option<f64>,
    pub starting_drop_size_mm2: Option<f64>,
    pub short_circuit_size_mm2: Option<f64>,
    pub final_size_mm2: Option<f64>,
    pub runs: u32,
    pub size_per_run_mm2: Option<f64>,
    pub voltage_drop_v: f64,
    pub voltage_drop_percent: f64,
    pub starting_voltage_drop_percent: Option<f64>,
    pub driving_constraint: Option<Constraint>,
    pub designation: String,
    pub status: SizingStatus,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

impl SizingResult {
    fn invalid(
        index: usize,
        segment: &CableSegment,
        resolved: &ResolvedSegment,
        reasons: Vec<String>,
    ) -> Self {
        Self {
            segment_id: segment.id.clone(),
            segment_index: index,
            material: resolved.material,
            insulation: resolved.insulation,
            cores: resolved.cores,
            full_load_current_a: 0.0,
            starting_current_a: None,
            derating: DeratingBreakdown::unity(),
            catalog_rating_a: 0.0,
            installed_rating_a: 0.0,
            derated_current_a: 0.0,
            ampacity_size_mm2: None,
            running_drop_size_mm2: None,
            starting_drop_size_mm2: None,
            short_circuit_size_mm2: None,
            final_size_mm2: None,
            runs: 0,
            size_per_run_mm2: None,
            voltage_drop_v: 0.0,
            voltage_drop_percent: 0.0,
            starting_voltage_drop_percent: None,
            driving_constraint: None,
            designation: String::new(),
            status: SizingStatus::Failed,
            warnings: reasons,
            notes: Vec::new(),
        }
    }

    pub fn is_sized(&self) -> bool {
        self.final_size_mm2.is_some()
    }
}

fn segment_context(segment: &CableSegment) -> LogContext<'_> {
    LogContext::new()
        .with_segment(&segment.id)
        .with_bus(&segment.origin_bus)
}

/// Sizes one segment. Never fails: invalid input is reported through [`SizingStatus::Failed`].
pub fn size_segment(index: usize, segment: &CableSegment, context: &SizingContext) -> SizingResult {
    let (resolved, notes) = resolve(segment, context);
    let reasons = validate(segment);
    if !reasons.is_empty() {
        cable_warn!(
            context = segment_context(segment),
            "invalid segment input: {}",
            reasons.join("; ")
        );
        return SizingResult::invalid(index, segment, &resolved, reasons);
    }
    let mut warnings = Vec::new();
    let mut failed = false;

    let flc = current::full_load_current(
        resolved.power_kw,
        resolved.voltage_v,
        resolved.phases,
        resolved.power_factor,
        resolved.efficiency,
    );
    let starting_current = resolved
        .starting
        .map(|s| current::starting_current(flc, s.profile.current_multiplier));
    let factors = derating_factors(&resolved.conditions());

    let mut ampacity = size_for_current(&resolved, flc, factors.total);
    if let Some(start) = starting_current {
        let on_start = size_for_current(&resolved, start, factors.total);
        if on_start.index() > ampacity.index() || on_start.is_exceeded() {
            ampacity = on_start;
        }
    }
    if ampacity.is_exceeded() {
        warnings.push(format!(
            "ampacity not met at {} mm²",
            CatalogIndex::LARGEST.size_mm2()
        ));
    }

    let running = size_for_drop(
        &resolved,
        flc,
        resolved.power_factor,
        resolved.running_limit_percent,
    );
    if running.is_exceeded() {
        warnings.push(format!(
            "running voltage drop limit {:.1}% not met at {} mm²",
            resolved.running_limit_percent,
            CatalogIndex::LARGEST.size_mm2()
        ));
    }

    let starting_demand = match (resolved.starting, starting_current) {
        (Some(conditions), Some(current_a)) => Some(StartingDemand {
            current_a,
            power_factor: resolved
                .starting_power_factor()
                .unwrap_or(resolved.power_factor),
            limit_percent: conditions.profile.drop_limit_percent,
        }),
        _ => None,
    };
    let starting = starting_demand.map(|demand| {
        size_for_drop(
            &resolved,
            demand.current_a,
            demand.power_factor,
            demand.limit_percent,
        )
    });
    if let (Some(search), Some(demand)) = (starting, starting_demand) {
        if search.is_exceeded() {
            warnings.push(format!(
                "starting voltage drop limit {:.1}% not met at {} mm²",
                demand.limit_percent,
                CatalogIndex::LARGEST.size_mm2()
            ));
        }
    }

    let withstand = size_for_withstand(&resolved);
    if let (Some(search), Some(duty)) = (withstand, resolved.fault_duty) {
        if search.is_exceeded() {
            failed = true;
            warnings.push(format!(
                "no catalog size withstands {:.1} kA for {:.2} s",
                duty.current_ka, duty.clearing_time_s
            ));
        }
    }

    let candidates = Candidates {
        ampacity: ampacity.index(),
        running_drop: running.index(),
        starting_drop: starting.map(|s| s.index()),
        short_circuit: withstand.map(|s| s.index()),
    };
    let (selected, driving) = candidates.select();

    let demand = RunDemand {
        full_load_current_a: flc,
        running_power_factor: resolved.power_factor,
        running_limit_percent: resolved.running_limit_percent,
        starting: starting_demand,
        derating: factors.total,
    };
    let plan = plan_runs(&resolved, selected, &demand);
    if let Some(warning) = plan.warning.clone() {
        warnings.push(warning);
    }

    let runs = f64::from(plan.runs);
    let drop = voltage_drop(&resolved, plan.per_run, flc / runs, resolved.power_factor);
    let starting_drop = starting_demand.map(|demand| {
        voltage_drop(
            &resolved,
            plan.per_run,
            demand.current_a / runs,
            demand.power_factor,
        )
        .percent
    });

    let status = if failed {
        SizingStatus::Failed
    } else if !warnings.is_empty() {
        SizingStatus::Warning
    } else {
        SizingStatus::Approved
    };

    debug!(
        segment = %segment.id,
        ampacity_mm2 = candidates.ampacity.size_mm2(),
        running_mm2 = candidates.running_drop.size_mm2(),
        driving = %driving,
        runs = plan.runs,
        "segment sized"
    );
    if status != SizingStatus::Approved {
        cable_warn!(
            context = segment_context(segment),
            "sized with status {}: {}",
            status,
            warnings.join("; ")
        );
    }

    SizingResult {
        segment_id: segment.id.clone(),
        segment_index: index,
        material: resolved.material,
        insulation: resolved.insulation,
        cores: resolved.cores,
        full_load_current_a: flc,
        starting_current_a: starting_current,
        derating: factors,
        catalog_rating_a: segment_rating(&resolved, plan.per_run),
        installed_rating_a: installed_rating(&resolved, plan.per_run, factors.total) * runs,
        derated_current_a: flc / factors.total,
        ampacity_size_mm2: Some(candidates.ampacity.size_mm2()),
        running_drop_size_mm2: Some(candidates.running_drop.size_mm2()),
        starting_drop_size_mm2: candidates.starting_drop.map(|idx| idx.size_mm2()),
        short_circuit_size_mm2: candidates.short_circuit.map(|idx| idx.size_mm2()),
        final_size_mm2: Some(selected.size_mm2()),
        runs: plan.runs,
        size_per_run_mm2: Some(plan.per_run.size_mm2()),
        voltage_drop_v: drop.volts,
        voltage_drop_percent: drop.percent,
        starting_voltage_drop_percent: starting_drop,
        driving_constraint: Some(driving),
        designation: designation(&resolved, plan.runs, plan.per_run),
        status,
        warnings,
        notes,
    }
}

/// Sizes every power-carrying segment, preserving input order.
pub fn size_segments(
    segments: &[CableSegment],
    context: &SizingContext,
    parallel: bool,
) -> Vec<SizingResult> {
    let work: Vec<(usize, &CableSegment)> = segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| segment.carries_power())
        .collect();

    #[cfg(feature = "parallel")]
    if parallel {
        use rayon::prelude::*;
        return work
            .par_iter()
            .map(|(index, segment)| size_segment(*index, segment, context))
            .collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    work.iter()
        .map(|(index, segment)| size_segment(*index, segment, context))
        .collect()
}
