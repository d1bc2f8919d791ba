//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Derating factor lookup and aggregation."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::{
    interpolate::{nearest_step, piecewise_linear},
    model::{InstallationMethod, Insulation},
    tables::derating::{grouping_table, soil_curve, temperature_curve, BURIAL_DEPTH},
};

/// The four correction factors and their product. The product multiplies the catalog rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeratingBreakdown {
    pub temperature: f64,
    pub grouping: f64,
    pub soil: f64,
    pub depth: f64,
    pub total: f64,
}

impl DeratingBreakdown {
    pub fn unity() -> Self {
        Self {
            temperature: 1.0,
            grouping: 1.0,
            soil: 1.0,
            depth: 1.0,
            total: 1.0,
        }
    }
}

/// Installation conditions that drive derating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstallationConditions {
    pub installation: InstallationMethod,
    pub insulation: Insulation,
    pub ambient_temp_c: f64,
    pub grouped_circuits: u32,
    pub soil_resistivity_km_w: f64,
    pub burial_depth_m: f64,
}

pub fn derating_factors(conditions: &InstallationConditions) -> DeratingBreakdown {
    let temperature = piecewise_linear(
        temperature_curve(conditions.installation, conditions.insulation),
        conditions.ambient_temp_c,
    );
    let grouping = nearest_step(
        grouping_table(conditions.installation),
        conditions.grouped_circuits.max(1),
    );
    let (soil, depth) = match soil_curve(conditions.installation) {
        Some(curve) => (
            piecewise_linear(curve, conditions.soil_resistivity_km_w),
            piecewise_linear(BURIAL_DEPTH, conditions.burial_depth_m),
        ),
        None => (1.0, 1.0),
    };
    DeratingBreakdown {
        temperature,
        grouping,
        soil,
        depth,
        total: temperature * grouping * soil * depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(installation: InstallationMethod) -> InstallationConditions {
        InstallationConditions {
            installation,
            insulation: Insulation::Xlpe,
            ambient_temp_c: if installation.is_buried() { 20.0 } else { 30.0 },
            grouped_circuits: 1,
            soil_resistivity_km_w: 2.5,
            burial_depth_m: 0.7,
        }
    }

    #[test]
    fn reference_conditions_give_unity() {
        for installation in [
            InstallationMethod::Air,
            InstallationMethod::Tray,
            InstallationMethod::BuriedDirect,
            InstallationMethod::BuriedDuct,
        ] {
            let factors = derating_factors(&conditions(installation));
            assert_eq!(factors, DeratingBreakdown::unity());
        }
    }

    #[test]
    fn total_is_the_product_of_factors() {
        let mut c = conditions(InstallationMethod::BuriedDirect);
        c.ambient_temp_c = 30.0;
        c.grouped_circuits = 3;
        c.soil_resistivity_km_w = 1.5;
        c.burial_depth_m = 1.0;
        let f = derating_factors(&c);
        assert_eq!(f.temperature, 0.93);
        assert_eq!(f.grouping, 0.65);
        assert_eq!(f.soil, 1.28);
        assert_eq!(f.depth, 0.97);
        assert!((f.total - 0.93 * 0.65 * 1.28 * 0.97).abs() < 1e-12);
    }

    #[test]
    fn soil_and_depth_ignored_above_ground() {
        let mut c = conditions(InstallationMethod::Air);
        c.soil_resistivity_km_w = 3.0;
        c.burial_depth_m = 3.0;
        let f = derating_factors(&c);
        assert_eq!((f.soil, f.depth), (1.0, 1.0));
    }

    #[test]
    fn temperature_is_interpolated() {
        let mut c = conditions(InstallationMethod::Air);
        c.ambient_temp_c = 42.5;
        let f = derating_factors(&c);
        assert!((f.temperature - 0.89).abs() < 1e-12);
    }

    #[test]
    fn derating_never_increases_moving_away_from_reference() {
        let base = conditions(InstallationMethod::BuriedDirect);
        let mut previous = derating_factors(&base).total;
        for step in 1..=40 {
            let mut c = base;
            c.ambient_temp_c = 20.0 + step as f64 * 1.5;
            let total = derating_factors(&c).total;
            assert!(total <= previous + 1e-12);
            previous = total;
        }

        let mut previous = derating_factors(&base).total;
        for count in 2..=25 {
            let mut c = base;
            c.grouped_circuits = count;
            let total = derating_factors(&c).total;
            assert!(total <= previous + 1e-12);
            previous = total;
        }

        let mut previous = derating_factors(&base).total;
        for step in 1..=30 {
            let mut c = base;
            c.burial_depth_m = 0.7 + step as f64 * 0.1;
            let total = derating_factors(&c).total;
            assert!(total <= previous + 1e-12);
            previous = total;
        }
    }
}
