//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Installed current rating and ampacity-driven size search."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use super::{first_size, ResolvedSegment, SizeSearch};
use crate::tables::{conductors::catalog_rating, CatalogIndex};

pub fn segment_rating(segment: &ResolvedSegment, index: CatalogIndex) -> f64 {
    catalog_rating(
        index,
        segment.installation,
        segment.material,
        segment.insulation,
        segment.cores,
    )
}

/// Catalog rating multiplied by the total derating factor.
pub fn installed_rating(segment: &ResolvedSegment, index: CatalogIndex, derating: f64) -> f64 {
    segment_rating(segment, index) * derating
}

/// Smallest size whose installed rating carries `current_a`.
pub fn size_for_current(segment: &ResolvedSegment, current_a: f64, derating: f64) -> SizeSearch {
    first_size(|idx| installed_rating(segment, idx, derating) >= current_a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{CableSegment, ConductorMaterial, InstallationMethod, Insulation},
        sizing::{resolve, SizingContext},
    };

    fn air_feeder() -> ResolvedSegment {
        let segment = CableSegment::new("C1", "LOAD", "TRF", 415.0, 45.0, 50.0);
        resolve(&segment, &SizingContext::default()).0
    }

    #[test]
    fn picks_smallest_size_that_carries_current() {
        let segment = air_feeder();
        // 69.6 A on Cu/XLPE in air: 10 mm² is rated 75 A
        let search = size_for_current(&segment, 69.6, 1.0);
        assert_eq!(search.index().size_mm2(), 10.0);
    }

    #[test]
    fn derating_pushes_selection_up() {
        let segment = air_feeder();
        let plain = size_for_current(&segment, 69.6, 1.0).index();
        let derated = size_for_current(&segment, 69.6, 0.7).index();
        assert!(derated > plain);
        assert!(installed_rating(&segment, derated, 0.7) >= 69.6);
    }

    #[test]
    fn rating_reflects_conductor_choice() {
        let segment = CableSegment::new("C1", "LOAD", "TRF", 415.0, 45.0, 50.0)
            .with_conductor(ConductorMaterial::Aluminium, Insulation::Pvc, 4)
            .with_installation(InstallationMethod::Conduit);
        let resolved = resolve(&segment, &SizingContext::default()).0;
        let idx = CatalogIndex::at_least(50.0).unwrap();
        assert!((segment_rating(&resolved, idx) - 154.0 * 0.78 * 0.80).abs() < 1e-9);
    }

    #[test]
    fn oversized_current_reports_largest_as_exceeded() {
        let segment = air_feeder();
        let search = size_for_current(&segment, 5000.0, 1.0);
        assert!(search.is_exceeded());
        assert_eq!(search.index(), CatalogIndex::LARGEST);
    }
}
