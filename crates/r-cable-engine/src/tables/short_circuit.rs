//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Adiabatic short-circuit constants per conductor and insulation."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use crate::model::{ConductorMaterial, Insulation};

/// PVC k values drop above this cross section (IEC 60364-5-54 Table A.54.4).
pub const PVC_LARGE_CONDUCTOR_MM2: f64 = 300.0;

/// k in A·√s/mm² for the withstand area `S = I / (k·√t)`.
pub fn k_constant(material: ConductorMaterial, insulation: Insulation, size_mm2: f64) -> f64 {
    let large = size_mm2 > PVC_LARGE_CONDUCTOR_MM2;
    match (material, insulation) {
        (ConductorMaterial::Copper, Insulation::Pvc) if large => 103.0,
        (ConductorMaterial::Copper, Insulation::Pvc) => 115.0,
        (ConductorMaterial::Copper, Insulation::Xlpe | Insulation::Epr) => 143.0,
        (ConductorMaterial::Aluminium, Insulation::Pvc) if large => 68.0,
        (ConductorMaterial::Aluminium, Insulation::Pvc) => 76.0,
        (ConductorMaterial::Aluminium, Insulation::Xlpe | Insulation::Epr) => 94.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copper_xlpe_is_143() {
        assert_eq!(
            k_constant(ConductorMaterial::Copper, Insulation::Xlpe, 95.0),
            143.0
        );
    }

    #[test]
    fn pvc_k_drops_for_large_conductors() {
        assert_eq!(
            k_constant(ConductorMaterial::Copper, Insulation::Pvc, 300.0),
            115.0
        );
        assert_eq!(
            k_constant(ConductorMaterial::Copper, Insulation::Pvc, 400.0),
            103.0
        );
        assert_eq!(
            k_constant(ConductorMaterial::Aluminium, Insulation::Pvc, 500.0),
            68.0
        );
    }
}
