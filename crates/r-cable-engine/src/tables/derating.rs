//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Environmental correction factor curves."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use crate::model::{InstallationMethod, Insulation};

pub const REFERENCE_AIR_TEMP_C: f64 = 30.0;
pub const REFERENCE_GROUND_TEMP_C: f64 = 20.0;
pub const REFERENCE_SOIL_RESISTIVITY: f64 = 2.5;
pub const REFERENCE_BURIAL_DEPTH_M: f64 = 0.7;

// Ambient air temperature (°C) -> factor, IEC 60364-5-52 Table B.52.14.
pub const AIR_TEMPERATURE_PVC: &[(f64, f64)] = &[
    (10.0, 1.22),
    (15.0, 1.17),
    (20.0, 1.12),
    (25.0, 1.06),
    (30.0, 1.00),
    (35.0, 0.94),
    (40.0, 0.87),
    (45.0, 0.79),
    (50.0, 0.71),
    (55.0, 0.61),
    (60.0, 0.50),
];

pub const AIR_TEMPERATURE_XLPE: &[(f64, f64)] = &[
    (10.0, 1.15),
    (15.0, 1.12),
    (20.0, 1.08),
    (25.0, 1.04),
    (30.0, 1.00),
    (35.0, 0.96),
    (40.0, 0.91),
    (45.0, 0.87),
    (50.0, 0.82),
    (55.0, 0.76),
    (60.0, 0.71),
    (65.0, 0.65),
    (70.0, 0.58),
    (75.0, 0.50),
    (80.0, 0.41),
];

// Ground temperature (°C) -> factor, Table B.52.15.
pub const GROUND_TEMPERATURE_PVC: &[(f64, f64)] = &[
    (10.0, 1.10),
    (15.0, 1.05),
    (20.0, 1.00),
    (25.0, 0.95),
    (30.0, 0.89),
    (35.0, 0.84),
    (40.0, 0.77),
    (45.0, 0.71),
    (50.0, 0.63),
    (55.0, 0.55),
    (60.0, 0.45),
];

pub const GROUND_TEMPERATURE_XLPE: &[(f64, f64)] = &[
    (10.0, 1.07),
    (15.0, 1.04),
    (20.0, 1.00),
    (25.0, 0.96),
    (30.0, 0.93),
    (35.0, 0.89),
    (40.0, 0.85),
    (45.0, 0.80),
    (50.0, 0.76),
    (55.0, 0.71),
    (60.0, 0.65),
    (65.0, 0.60),
    (70.0, 0.53),
    (75.0, 0.46),
    (80.0, 0.38),
];

// Number of loaded circuits -> factor. Table B.52.17 items 1 and 4, B.52.18, B.52.19.
pub const GROUPING_BUNCHED: &[(u32, f64)] = &[
    (1, 1.00),
    (2, 0.80),
    (3, 0.70),
    (4, 0.65),
    (5, 0.60),
    (6, 0.57),
    (7, 0.54),
    (8, 0.52),
    (9, 0.50),
    (12, 0.45),
    (16, 0.41),
    (20, 0.38),
];

pub const GROUPING_TRAY: &[(u32, f64)] = &[
    (1, 1.00),
    (2, 0.88),
    (3, 0.82),
    (4, 0.77),
    (5, 0.75),
    (6, 0.73),
    (7, 0.73),
    (8, 0.72),
    (9, 0.72),
];

pub const GROUPING_BURIED_DIRECT: &[(u32, f64)] = &[
    (1, 1.00),
    (2, 0.75),
    (3, 0.65),
    (4, 0.60),
    (5, 0.55),
    (6, 0.50),
    (7, 0.45),
    (8, 0.43),
    (9, 0.41),
    (12, 0.36),
    (16, 0.32),
    (20, 0.29),
];

pub const GROUPING_BURIED_DUCT: &[(u32, f64)] = &[
    (1, 1.00),
    (2, 0.85),
    (3, 0.75),
    (4, 0.70),
    (5, 0.65),
    (6, 0.60),
    (7, 0.57),
    (8, 0.54),
    (9, 0.52),
    (10, 0.49),
    (11, 0.47),
    (12, 0.45),
    (13, 0.44),
    (14, 0.42),
    (15, 0.41),
    (16, 0.39),
    (17, 0.38),
    (18, 0.37),
    (19, 0.35),
    (20, 0.34),
];

// Soil thermal resistivity (K·m/W) -> factor, Table B.52.16.
pub const SOIL_RESISTIVITY_DIRECT: &[(f64, f64)] = &[
    (0.5, 1.88),
    (0.7, 1.62),
    (1.0, 1.50),
    (1.5, 1.28),
    (2.0, 1.12),
    (2.5, 1.00),
    (3.0, 0.90),
];

pub const SOIL_RESISTIVITY_DUCT: &[(f64, f64)] = &[
    (0.5, 1.28),
    (0.7, 1.20),
    (1.0, 1.18),
    (1.5, 1.10),
    (2.0, 1.05),
    (2.5, 1.00),
    (3.0, 0.96),
];

// Depth of laying (m) -> factor.
pub const BURIAL_DEPTH: &[(f64, f64)] = &[
    (0.5, 1.02),
    (0.7, 1.00),
    (0.9, 0.98),
    (1.0, 0.97),
    (1.2, 0.96),
    (1.5, 0.94),
    (2.0, 0.92),
    (2.5, 0.91),
    (3.0, 0.90),
];

pub fn temperature_curve(
    installation: InstallationMethod,
    insulation: Insulation,
) -> &'static [(f64, f64)] {
    match (installation.is_buried(), insulation) {
        (false, Insulation::Pvc) => AIR_TEMPERATURE_PVC,
        (false, Insulation::Xlpe | Insulation::Epr) => AIR_TEMPERATURE_XLPE,
        (true, Insulation::Pvc) => GROUND_TEMPERATURE_PVC,
        (true, Insulation::Xlpe | Insulation::Epr) => GROUND_TEMPERATURE_XLPE,
    }
}

pub fn grouping_table(installation: InstallationMethod) -> &'static [(u32, f64)] {
    match installation {
        InstallationMethod::Air | InstallationMethod::Conduit | InstallationMethod::Clipped => {
            GROUPING_BUNCHED
        }
        InstallationMethod::Tray => GROUPING_TRAY,
        InstallationMethod::BuriedDirect => GROUPING_BURIED_DIRECT,
        InstallationMethod::BuriedDuct => GROUPING_BURIED_DUCT,
    }
}

/// Soil curve for buried installations; `None` above ground.
pub fn soil_curve(installation: InstallationMethod) -> Option<&'static [(f64, f64)]> {
    match installation {
        InstallationMethod::BuriedDirect => Some(SOIL_RESISTIVITY_DIRECT),
        InstallationMethod::BuriedDuct => Some(SOIL_RESISTIVITY_DUCT),
        _ => None,
    }
}
