//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Final size selection, parallel runs and cable designation."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::Display;

use super::{ampacity::installed_rating, voltage_drop::voltage_drop, ResolvedSegment};
use crate::{
    model::ConductorMaterial,
    tables::{conductors::single_run_ceiling, CatalogIndex},
};

/// Check that produced the governing size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Constraint {
    Ampacity,
    RunningDrop,
    StartingDrop,
    ShortCircuit,
}

/// Per-constraint minimum sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidates {
    pub ampacity: CatalogIndex,
    pub running_drop: CatalogIndex,
    pub starting_drop: Option<CatalogIndex>,
    pub short_circuit: Option<CatalogIndex>,
}

impl Candidates {
    /// Largest candidate and the constraint that produced it. Equal sizes resolve in
    /// declaration order of [`Constraint`].
    pub fn select(&self) -> (CatalogIndex, Constraint) {
        let ordered = [
            (Some(self.ampacity), Constraint::Ampacity),
            (Some(self.running_drop), Constraint::RunningDrop),
            (self.starting_drop, Constraint::StartingDrop),
            (self.short_circuit, Constraint::ShortCircuit),
        ];
        let mut best = (self.ampacity, Constraint::Ampacity);
        for (candidate, constraint) in ordered {
            if let Some(idx) = candidate {
                if idx > best.0 {
                    best = (idx, constraint);
                }
            }
        }
        best
    }
}

/// Loading a run arrangement must carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunDemand {
    pub full_load_current_a: f64,
    pub running_power_factor: f64,
    pub running_limit_percent: f64,
    pub starting: Option<StartingDemand>,
    pub derating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartingDemand {
    pub current_a: f64,
    pub power_factor: f64,
    pub limit_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub runs: u32,
    pub per_run: CatalogIndex,
    /// Set when the selected size could not be brought under the single-run ceiling.
    pub warning: Option<String>,
}

impl RunPlan {
    fn single(per_run: CatalogIndex, warning: Option<String>) -> Self {
        Self {
            runs: 1,
            per_run,
            warning,
        }
    }
}

/// Splits a copper selection above the single-run ceiling into two equal runs when both
/// runs still meet every check at half the load. Aluminium above its ceiling is flagged only.
pub fn plan_runs(segment: &ResolvedSegment, selected: CatalogIndex, demand: &RunDemand) -> RunPlan {
    let ceiling = single_run_ceiling(segment.material);
    if selected.size_mm2() <= ceiling {
        return RunPlan::single(selected, None);
    }
    if segment.material != ConductorMaterial::Copper {
        return RunPlan::single(
            selected,
            Some(format!(
                "{} mm² {} exceeds the {} mm² single-run ceiling; parallel runs are only planned for copper",
                selected.size_mm2(),
                segment.material,
                ceiling
            )),
        );
    }

    let Some(per_run) = CatalogIndex::at_least((selected.size_mm2() / 2.0).ceil()) else {
        return RunPlan::single(selected, Some("no catalog size for a two-run split".into()));
    };
    let failures = split_failures(segment, per_run, demand, ceiling);
    if failures.is_empty() {
        RunPlan {
            runs: 2,
            per_run,
            warning: None,
        }
    } else {
        RunPlan::single(
            selected,
            Some(format!(
                "{} mm² exceeds the {} mm² single-run ceiling and 2 x {} mm² fails: {}",
                selected.size_mm2(),
                ceiling,
                per_run.size_mm2(),
                failures.join(", ")
            )),
        )
    }
}

fn split_failures(
    segment: &ResolvedSegment,
    per_run: CatalogIndex,
    demand: &RunDemand,
    ceiling: f64,
) -> Vec<String> {
    let mut failures = Vec::new();
    let rating = installed_rating(segment, per_run, demand.derating);
    let running_share = demand.full_load_current_a / 2.0;

    if rating < running_share {
        failures.push(format!("ampacity {rating:.1} A < {running_share:.1} A"));
    }
    let running = voltage_drop(
        segment,
        per_run,
        running_share,
        demand.running_power_factor,
    );
    if running.percent > demand.running_limit_percent {
        failures.push(format!(
            "running drop {:.2}% > {:.2}%",
            running.percent, demand.running_limit_percent
        ));
    }
    if let Some(starting) = demand.starting {
        let starting_share = starting.current_a / 2.0;
        if rating < starting_share {
            failures.push(format!(
                "starting ampacity {rating:.1} A < {starting_share:.1} A"
            ));
        }
        let drop = voltage_drop(segment, per_run, starting_share, starting.power_factor);
        if drop.percent > starting.limit_percent {
            failures.push(format!(
                "starting drop {:.2}% > {:.2}%",
                drop.percent, starting.limit_percent
            ));
        }
    }
    if per_run.size_mm2() > ceiling {
        failures.push(format!(
            "{} mm² per run is above the ceiling",
            per_run.size_mm2()
        ));
    }
    failures
}

/// `3C x 95 mm² Cu/XLPE`, or `2 x (3C x 240 mm² Cu/XLPE)` for parallel runs.
pub fn designation(segment: &ResolvedSegment, runs: u32, per_run: CatalogIndex) -> String {
    let cable = format!(
        "{}C x {} mm² {}/{}",
        segment.cores,
        per_run.size_mm2(),
        segment.material,
        segment.insulation
    );
    if runs > 1 {
        format!("{runs} x ({cable})")
    } else {
        cable
    }
}
