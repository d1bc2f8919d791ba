//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Full-load and motor starting current."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---

/// `I = 1000·P / (√3·V·cosφ·η)` for three-phase, `1000·P / (V·cosφ·η)` for single-phase.
pub fn full_load_current(
    power_kw: f64,
    voltage_v: f64,
    phases: u8,
    power_factor: f64,
    efficiency: f64,
) -> f64 {
    let line_factor = if phases == 1 { 1.0 } else { 3f64.sqrt() };
    1000.0 * power_kw / (line_factor * voltage_v * power_factor * efficiency)
}

pub fn starting_current(full_load_current: f64, multiplier: f64) -> f64 {
    full_load_current * multiplier
}
