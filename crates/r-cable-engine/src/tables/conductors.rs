//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Conductor size catalog, current ratings and impedance data."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::model::{ConductorMaterial, InstallationMethod, Insulation};

/// Standard metric cross sections, ascending (mm²).
pub const CONDUCTOR_SIZES_MM2: [f64; 19] = [
    1.5, 2.5, 4.0, 6.0, 10.0, 16.0, 25.0, 35.0, 50.0, 70.0, 95.0, 120.0, 150.0, 185.0, 240.0,
    300.0, 400.0, 500.0, 630.0,
];

/// Per-size catalog row: DC resistance at 20 °C (Ω/km), 50 Hz reactance (Ω/km), and
/// copper/XLPE current ratings (A) for three loaded conductors per installation method.
#[derive(Debug, Clone, Copy)]
pub struct ConductorRow {
    pub size_mm2: f64,
    pub r20_copper: f64,
    pub r20_aluminium: f64,
    pub reactance: f64,
    pub rating_air: f64,
    pub rating_conduit: f64,
    pub rating_clipped: f64,
    pub rating_buried_direct: f64,
    pub rating_buried_duct: f64,
}

const fn row(
    size_mm2: f64,
    r20_copper: f64,
    r20_aluminium: f64,
    reactance: f64,
    ratings: [f64; 5],
) -> ConductorRow {
    ConductorRow {
        size_mm2,
        r20_copper,
        r20_aluminium,
        reactance,
        rating_air: ratings[0],
        rating_conduit: ratings[1],
        rating_clipped: ratings[2],
        rating_buried_direct: ratings[3],
        rating_buried_duct: ratings[4],
    }
}

//                          size    R20 Cu   R20 Al   X       air     B2     C      D2     D1
pub const CONDUCTOR_TABLE: [ConductorRow; 19] = [
    row(1.5, 12.1, 20.1, 0.115, [23.0, 19.5, 24.0, 22.0, 21.0]),
    row(2.5, 7.41, 12.1, 0.110, [32.0, 26.0, 33.0, 29.0, 28.0]),
    row(4.0, 4.61, 7.41, 0.107, [42.0, 35.0, 45.0, 37.0, 36.0]),
    row(6.0, 3.08, 4.61, 0.100, [54.0, 44.0, 58.0, 46.0, 44.0]),
    row(10.0, 1.83, 3.08, 0.094, [75.0, 60.0, 80.0, 61.0, 58.0]),
    row(16.0, 1.15, 1.91, 0.090, [100.0, 80.0, 107.0, 79.0, 75.0]),
    row(25.0, 0.727, 1.20, 0.086, [127.0, 105.0, 138.0, 101.0, 96.0]),
    row(35.0, 0.524, 0.868, 0.083, [158.0, 128.0, 171.0, 122.0, 115.0]),
    row(50.0, 0.387, 0.641, 0.083, [192.0, 154.0, 209.0, 144.0, 135.0]),
    row(70.0, 0.268, 0.443, 0.080, [246.0, 194.0, 269.0, 178.0, 167.0]),
    row(95.0, 0.193, 0.320, 0.080, [298.0, 233.0, 328.0, 211.0, 197.0]),
    row(120.0, 0.153, 0.253, 0.079, [346.0, 268.0, 382.0, 240.0, 223.0]),
    row(150.0, 0.124, 0.206, 0.079, [399.0, 300.0, 441.0, 271.0, 251.0]),
    row(185.0, 0.0991, 0.164, 0.079, [456.0, 340.0, 506.0, 304.0, 281.0]),
    row(240.0, 0.0754, 0.125, 0.078, [538.0, 398.0, 599.0, 351.0, 324.0]),
    row(300.0, 0.0601, 0.100, 0.078, [621.0, 455.0, 693.0, 396.0, 365.0]),
    row(400.0, 0.0470, 0.0778, 0.077, [754.0, 520.0, 803.0, 450.0, 415.0]),
    row(500.0, 0.0366, 0.0605, 0.077, [868.0, 590.0, 929.0, 510.0, 470.0]),
    row(630.0, 0.0283, 0.0469, 0.076, [1005.0, 670.0, 1074.0, 575.0, 530.0]),
];

/// Rating multiplier relative to copper.
pub const ALUMINIUM_RATING_RATIO: f64 = 0.78;

/// Rating multiplier relative to XLPE (90 °C conductor).
pub const PVC_RATING_RATIO: f64 = 0.80;

/// Rating multiplier by core count relative to the three-loaded-conductor columns.
pub const SINGLE_CORE_RATING_RATIO: f64 = 1.08;
pub const TWO_CORE_RATING_RATIO: f64 = 1.17;

/// Resistance multiplier for proximity effect in cables with three or more cores.
pub const MULTICORE_PROXIMITY_FACTOR: f64 = 1.02;

/// Linear temperature coefficients of resistance at 20 °C (1/K).
pub const COPPER_TEMP_COEFFICIENT: f64 = 0.00393;
pub const ALUMINIUM_TEMP_COEFFICIENT: f64 = 0.00403;

/// Largest conductor considered practical to pull as a single run (mm²).
pub const COPPER_SINGLE_RUN_CEILING_MM2: f64 = 185.0;
pub const ALUMINIUM_SINGLE_RUN_CEILING_MM2: f64 = 240.0;

/// Position in [`CONDUCTOR_SIZES_MM2`]. Ordering follows cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogIndex(usize);

impl CatalogIndex {
    pub const SMALLEST: CatalogIndex = CatalogIndex(0);
    pub const LARGEST: CatalogIndex = CatalogIndex(CONDUCTOR_SIZES_MM2.len() - 1);

    pub fn new(index: usize) -> Option<Self> {
        (index < CONDUCTOR_SIZES_MM2.len()).then_some(Self(index))
    }

    pub fn position(&self) -> usize {
        self.0
    }

    pub fn size_mm2(&self) -> f64 {
        CONDUCTOR_SIZES_MM2[self.0]
    }

    pub fn row(&self) -> &'static ConductorRow {
        &CONDUCTOR_TABLE[self.0]
    }

    /// Every catalog entry in ascending order.
    pub fn ascending() -> impl Iterator<Item = CatalogIndex> {
        (0..CONDUCTOR_SIZES_MM2.len()).map(CatalogIndex)
    }

    /// Smallest catalog size whose cross section is at least `area_mm2`.
    pub fn at_least(area_mm2: f64) -> Option<CatalogIndex> {
        Self::ascending().find(|idx| idx.size_mm2() >= area_mm2)
    }
}

/// Catalog current rating (A) before environmental derating.
pub fn catalog_rating(
    index: CatalogIndex,
    installation: InstallationMethod,
    material: ConductorMaterial,
    insulation: Insulation,
    cores: u8,
) -> f64 {
    let row = index.row();
    let base = match installation {
        InstallationMethod::Air | InstallationMethod::Tray => row.rating_air,
        InstallationMethod::Conduit => row.rating_conduit,
        InstallationMethod::Clipped => row.rating_clipped,
        InstallationMethod::BuriedDirect => row.rating_buried_direct,
        InstallationMethod::BuriedDuct => row.rating_buried_duct,
    };
    let material_ratio = match material {
        ConductorMaterial::Copper => 1.0,
        ConductorMaterial::Aluminium => ALUMINIUM_RATING_RATIO,
    };
    let insulation_ratio = match insulation {
        Insulation::Pvc => PVC_RATING_RATIO,
        Insulation::Xlpe | Insulation::Epr => 1.0,
    };
    let core_ratio = match cores {
        1 => SINGLE_CORE_RATING_RATIO,
        2 => TWO_CORE_RATING_RATIO,
        _ => 1.0,
    };
    base * material_ratio * insulation_ratio * core_ratio
}

/// DC resistance at 20 °C (Ω/km).
pub fn resistance_20c(index: CatalogIndex, material: ConductorMaterial) -> f64 {
    match material {
        ConductorMaterial::Copper => index.row().r20_copper,
        ConductorMaterial::Aluminium => index.row().r20_aluminium,
    }
}

pub fn reactance(index: CatalogIndex) -> f64 {
    index.row().reactance
}

pub fn temperature_coefficient(material: ConductorMaterial) -> f64 {
    match material {
        ConductorMaterial::Copper => COPPER_TEMP_COEFFICIENT,
        ConductorMaterial::Aluminium => ALUMINIUM_TEMP_COEFFICIENT,
    }
}

/// Maximum continuous conductor temperature (°C).
pub fn operating_temperature(insulation: Insulation) -> f64 {
    match insulation {
        Insulation::Pvc => 70.0,
        Insulation::Xlpe | Insulation::Epr => 90.0,
    }
}

pub fn single_run_ceiling(material: ConductorMaterial) -> f64 {
    match material {
        ConductorMaterial::Copper => COPPER_SINGLE_RUN_CEILING_MM2,
        ConductorMaterial::Aluminium => ALUMINIUM_SINGLE_RUN_CEILING_MM2,
    }
}
