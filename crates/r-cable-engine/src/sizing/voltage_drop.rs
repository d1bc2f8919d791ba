//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Temperature-corrected impedance and voltage drop."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use super::{first_size, ResolvedSegment, SizeSearch};
use crate::{
    model::{ConductorMaterial, Insulation},
    tables::{
        conductors::{
            operating_temperature, reactance, resistance_20c, temperature_coefficient,
            MULTICORE_PROXIMITY_FACTOR,
        },
        CatalogIndex,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageDrop {
    pub volts: f64,
    pub percent: f64,
}

/// AC resistance at the insulation's operating temperature (Ω/km).
pub fn operating_resistance(
    index: CatalogIndex,
    material: ConductorMaterial,
    insulation: Insulation,
    cores: u8,
) -> f64 {
    let r20 = resistance_20c(index, material);
    let alpha = temperature_coefficient(material);
    let hot = r20 * (1.0 + alpha * (operating_temperature(insulation) - 20.0));
    if cores >= 3 {
        hot * MULTICORE_PROXIMITY_FACTOR
    } else {
        hot
    }
}

/// `ΔV = k·I·L·(R·cosφ + X·sinφ)/1000` with `k = √3` for three-phase and `1` for single-phase.
pub fn voltage_drop(
    segment: &ResolvedSegment,
    index: CatalogIndex,
    current_a: f64,
    power_factor: f64,
) -> VoltageDrop {
    let r = operating_resistance(
        index,
        segment.material,
        segment.insulation,
        segment.cores,
    );
    let x = reactance(index);
    let cos_phi = power_factor.clamp(0.0, 1.0);
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
    let line_factor = if segment.phases == 1 { 1.0 } else { 3f64.sqrt() };
    let volts = line_factor * current_a * segment.length_m * (r * cos_phi + x * sin_phi) / 1000.0;
    VoltageDrop {
        volts,
        percent: volts / segment.voltage_v * 100.0,
    }
}

/// Smallest size whose drop at `current_a` stays within `limit_percent`.
pub fn size_for_drop(
    segment: &ResolvedSegment,
    current_a: f64,
    power_factor: f64,
    limit_percent: f64,
) -> SizeSearch {
    first_size(|idx| voltage_drop(segment, idx, current_a, power_factor).percent <= limit_percent)
}
