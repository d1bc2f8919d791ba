//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Adiabatic short-circuit withstand sizing."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use super::{first_size, ResolvedSegment, SizeSearch};
use crate::{
    model::{ConductorMaterial, Insulation},
    tables::{short_circuit::k_constant, CatalogIndex},
};

/// Prospective fault duty a cable must withstand until the protection clears it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultDuty {
    pub current_ka: f64,
    pub clearing_time_s: f64,
}

impl FaultDuty {
    /// Let-through energy `I²t` in A²s.
    pub fn let_through(&self) -> f64 {
        let amps = self.current_ka * 1000.0;
        amps * amps * self.clearing_time_s
    }
}

/// Minimum cross section `S = I / (k·√t)` (mm²), with `I` in amperes.
pub fn required_area(duty: &FaultDuty, k: f64) -> f64 {
    duty.current_ka * 1000.0 / (k * duty.clearing_time_s.sqrt())
}

/// Fault current a conductor can carry for `clearing_time_s` before exceeding its final temperature (kA).
pub fn withstand_ka(
    index: CatalogIndex,
    material: ConductorMaterial,
    insulation: Insulation,
    clearing_time_s: f64,
) -> f64 {
    let k = k_constant(material, insulation, index.size_mm2());
    index.size_mm2() * k * clearing_time_s.sqrt() / 1000.0
}

/// `None` when the segment carries no fault duty.
pub fn size_for_withstand(segment: &ResolvedSegment) -> Option<SizeSearch> {
    let duty = segment.fault_duty?;
    Some(first_size(|idx| {
        let k = k_constant(segment.material, segment.insulation, idx.size_mm2());
        idx.size_mm2() >= required_area(&duty, k)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{CableSegment, ProtectiveDevice},
        sizing::{resolve, SizingContext},
    };

    fn protected(ka: f64, time: Option<f64>) -> ResolvedSegment {
        let segment = CableSegment::new("C1", "LOAD", "TRF", 415.0, 10.0, 20.0).with_protection(
            ProtectiveDevice::Mccb,
            ka,
            time,
        );
        resolve(&segment, &SizingContext::default()).0
    }

    #[test]
    fn required_area_divides_fault_current_by_k_root_t() {
        let duty = FaultDuty {
            current_ka: 10.0,
            clearing_time_s: 0.25,
        };
        // 10 kA for 0.25 s on Cu/XLPE: 10000/(143·0.5) = 139.86 mm²
        assert!((required_area(&duty, 143.0) - 139.86).abs() < 0.01);
        assert_eq!(duty.let_through(), 25_000_000.0);
    }

    #[test]
    fn withstand_picks_next_catalog_size() {
        let segment = protected(10.0, Some(0.25));
        let search = size_for_withstand(&segment).unwrap();
        assert_eq!(search.index().size_mm2(), 150.0);
        assert!(!search.is_exceeded());
        let idx = search.index();
        let capacity = withstand_ka(idx, ConductorMaterial::Copper, Insulation::Xlpe, 0.25);
        assert!(capacity >= 10.0);
        let below = CatalogIndex::at_least(120.0).unwrap();
        assert!(withstand_ka(below, ConductorMaterial::Copper, Insulation::Xlpe, 0.25) < 10.0);
    }

    #[test]
    fn device_default_clearing_time_applies() {
        // MCCB default 0.2 s
        let segment = protected(10.0, None);
        assert_eq!(segment.fault_duty.unwrap().clearing_time_s, 0.2);
    }

    #[test]
    fn impossible_duty_is_exceeded() {
        // 200 kA in 0.1 s needs about 4400 mm²
        let segment = protected(200.0, Some(0.1));
        let search = size_for_withstand(&segment).unwrap();
        assert!(search.is_exceeded());
        assert_eq!(search.index(), CatalogIndex::LARGEST);
    }

    #[test]
    fn no_duty_means_no_candidate() {
        let segment = CableSegment::new("C1", "LOAD", "TRF", 415.0, 10.0, 20.0);
        let resolved = resolve(&segment, &SizingContext::default()).0;
        assert!(size_for_withstand(&resolved).is_none());
    }
}
