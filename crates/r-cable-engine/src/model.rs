//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Cable segment model and installation enumerations."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Normalized key used for every bus comparison (case-insensitive, trimmed).
pub fn bus_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// One cable of the edge list. `origin_bus` is the load side, `destination_bus` the supply side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableSegment {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub origin_bus: String,
    pub destination_bus: String,
    pub voltage_v: f64,
    #[serde(default = "default_phases")]
    pub phases: u8,
    pub power_kw: f64,
    pub length_m: f64,
    #[serde(default)]
    pub material: Option<ConductorMaterial>,
    #[serde(default)]
    pub insulation: Option<Insulation>,
    #[serde(default)]
    pub cores: Option<u8>,
    #[serde(default)]
    pub installation: Option<InstallationMethod>,
    #[serde(default)]
    pub ambient_temp_c: Option<f64>,
    #[serde(default)]
    pub soil_resistivity_km_w: Option<f64>,
    #[serde(default)]
    pub burial_depth_m: Option<f64>,
    #[serde(default)]
    pub grouped_circuits: Option<u32>,
    #[serde(default)]
    pub load_type: Option<LoadType>,
    #[serde(default)]
    pub efficiency: Option<f64>,
    #[serde(default)]
    pub power_factor: Option<f64>,
    #[serde(default)]
    pub starting_method: Option<StartingMethod>,
    #[serde(default)]
    pub protective_device: Option<ProtectiveDevice>,
    #[serde(default)]
    pub short_circuit_ka: Option<f64>,
    #[serde(default)]
    pub clearing_time_s: Option<f64>,
}

fn default_phases() -> u8 {
    3
}

impl CableSegment {
    /// Minimal segment; every optional attribute falls back to the documented defaults.
    pub fn new(
        id: impl Into<String>,
        origin_bus: impl Into<String>,
        destination_bus: impl Into<String>,
        voltage_v: f64,
        power_kw: f64,
        length_m: f64,
    ) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            origin_bus: origin_bus.into(),
            destination_bus: destination_bus.into(),
            voltage_v,
            phases: default_phases(),
            power_kw,
            length_m,
            material: None,
            insulation: None,
            cores: None,
            installation: None,
            ambient_temp_c: None,
            soil_resistivity_km_w: None,
            burial_depth_m: None,
            grouped_circuits: None,
            load_type: None,
            efficiency: None,
            power_factor: None,
            starting_method: None,
            protective_device: None,
            short_circuit_ka: None,
            clearing_time_s: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_phases(mut self, phases: u8) -> Self {
        self.phases = phases;
        self
    }

    pub fn with_conductor(
        mut self,
        material: ConductorMaterial,
        insulation: Insulation,
        cores: u8,
    ) -> Self {
        self.material = Some(material);
        self.insulation = Some(insulation);
        self.cores = Some(cores);
        self
    }

    pub fn with_installation(mut self, installation: InstallationMethod) -> Self {
        self.installation = Some(installation);
        self
    }

    pub fn with_ambient(mut self, ambient_temp_c: f64) -> Self {
        self.ambient_temp_c = Some(ambient_temp_c);
        self
    }

    pub fn with_grouping(mut self, grouped_circuits: u32) -> Self {
        self.grouped_circuits = Some(grouped_circuits);
        self
    }

    pub fn with_soil(mut self, resistivity_km_w: f64, depth_m: f64) -> Self {
        self.soil_resistivity_km_w = Some(resistivity_km_w);
        self.burial_depth_m = Some(depth_m);
        self
    }

    pub fn with_load(mut self, load_type: LoadType) -> Self {
        self.load_type = Some(load_type);
        self
    }

    pub fn with_power_factor(mut self, power_factor: f64, efficiency: f64) -> Self {
        self.power_factor = Some(power_factor);
        self.efficiency = Some(efficiency);
        self
    }

    pub fn with_starting(mut self, starting_method: StartingMethod) -> Self {
        self.starting_method = Some(starting_method);
        self
    }

    pub fn with_protection(
        mut self,
        device: ProtectiveDevice,
        short_circuit_ka: f64,
        clearing_time_s: Option<f64>,
    ) -> Self {
        self.protective_device = Some(device);
        self.short_circuit_ka = Some(short_circuit_ka);
        self.clearing_time_s = clearing_time_s;
        self
    }

    pub fn origin_key(&self) -> String {
        bus_key(&self.origin_bus)
    }

    pub fn destination_key(&self) -> String {
        bus_key(&self.destination_bus)
    }

    /// A row whose origin equals its destination is a panel header, not a cable.
    pub fn is_marker(&self) -> bool {
        self.origin_key() == self.destination_key()
    }

    pub fn has_buses(&self) -> bool {
        !self.origin_bus.trim().is_empty() && !self.destination_bus.trim().is_empty()
    }

    /// Segments that take part in traversal and sizing.
    pub fn carries_power(&self) -> bool {
        self.has_buses() && !self.is_marker()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum ConductorMaterial {
    #[serde(alias = "cu")]
    #[strum(to_string = "Cu", serialize = "copper")]
    Copper,
    #[serde(alias = "al", alias = "aluminum")]
    #[strum(to_string = "Al", serialize = "aluminium", serialize = "aluminum")]
    Aluminium,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum Insulation {
    #[strum(to_string = "PVC")]
    Pvc,
    #[strum(to_string = "XLPE")]
    Xlpe,
    #[strum(to_string = "EPR")]
    Epr,
}

/// Installation environment. Ratings follow the IEC 60364-5-52 reference methods noted per variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum InstallationMethod {
    /// Multicore cable in free air (method E).
    #[strum(to_string = "air", serialize = "free-air", serialize = "e")]
    Air,
    /// Perforated cable tray (method E, tray grouping).
    #[strum(to_string = "tray", serialize = "cable-tray", serialize = "ladder")]
    Tray,
    /// Cable in conduit on a wall (method B2).
    #[strum(to_string = "conduit", serialize = "b2")]
    Conduit,
    /// Clipped direct to a surface (method C).
    #[strum(to_string = "clipped", serialize = "clipped-direct", serialize = "c")]
    Clipped,
    /// Direct in ground (method D2).
    #[serde(alias = "buried", alias = "direct-buried")]
    #[strum(
        to_string = "buried-direct",
        serialize = "buried",
        serialize = "direct-buried",
        serialize = "d2"
    )]
    BuriedDirect,
    /// In ducts in the ground (method D1).
    #[serde(alias = "duct")]
    #[strum(to_string = "buried-duct", serialize = "duct", serialize = "d1")]
    BuriedDuct,
}

impl InstallationMethod {
    pub fn is_buried(&self) -> bool {
        matches!(
            self,
            InstallationMethod::BuriedDirect | InstallationMethod::BuriedDuct
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive, serialize_all = "kebab-case")]
pub enum LoadType {
    Motor,
    Heater,
    Transformer,
    Feeder,
    Pump,
    Fan,
    Compressor,
}

impl LoadType {
    /// Loads driven by an induction motor draw a starting current.
    pub fn is_motor_driven(&self) -> bool {
        matches!(
            self,
            LoadType::Motor | LoadType::Pump | LoadType::Fan | LoadType::Compressor
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum StartingMethod {
    #[serde(alias = "direct-on-line")]
    #[strum(to_string = "DOL", serialize = "direct-on-line")]
    Dol,
    #[serde(alias = "star_delta", alias = "y-d")]
    #[strum(to_string = "Star-Delta", serialize = "star_delta", serialize = "y-d")]
    StarDelta,
    #[serde(alias = "soft_starter", alias = "soft-start")]
    #[strum(to_string = "Soft-Starter", serialize = "soft_starter", serialize = "soft-start")]
    SoftStarter,
    #[serde(alias = "vsd", alias = "drive")]
    #[strum(to_string = "VFD", serialize = "vsd", serialize = "drive")]
    Vfd,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum ProtectiveDevice {
    #[strum(to_string = "MCB")]
    Mcb,
    #[strum(to_string = "MCCB")]
    Mccb,
    #[strum(to_string = "ACB")]
    Acb,
    #[strum(to_string = "Fuse")]
    Fuse,
}

/// Documented defaults applied to optional segment attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentDefaults {
    pub material: ConductorMaterial,
    pub insulation: Insulation,
    pub cores: u8,
    pub installation: InstallationMethod,
    pub ambient_air_c: f64,
    pub ambient_ground_c: f64,
    pub soil_resistivity_km_w: f64,
    pub burial_depth_m: f64,
    pub grouped_circuits: u32,
    pub load_type: LoadType,
    pub starting_method: StartingMethod,
}

impl Default for SegmentDefaults {
    fn default() -> Self {
        Self {
            material: ConductorMaterial::Copper,
            insulation: Insulation::Xlpe,
            cores: 3,
            installation: InstallationMethod::Air,
            ambient_air_c: crate::tables::derating::REFERENCE_AIR_TEMP_C,
            ambient_ground_c: crate::tables::derating::REFERENCE_GROUND_TEMP_C,
            soil_resistivity_km_w: crate::tables::derating::REFERENCE_SOIL_RESISTIVITY,
            burial_depth_m: crate::tables::derating::REFERENCE_BURIAL_DEPTH_M,
            grouped_circuits: 1,
            load_type: LoadType::Feeder,
            starting_method: StartingMethod::Dol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn marker_rows_are_detected_case_insensitively() {
        let header = CableSegment::new("MCC-1", "MCC-1 ", "mcc-1", 415.0, 0.0, 0.0);
        assert!(header.is_marker());
        assert!(!header.carries_power());

        let cable = CableSegment::new("C1", "M-101", "MCC-1", 415.0, 11.0, 40.0);
        assert!(!cable.is_marker());
        assert!(cable.carries_power());
    }

    #[test]
    fn blank_buses_do_not_carry_power() {
        let cable = CableSegment::new("C1", "  ", "MCC-1", 415.0, 11.0, 40.0);
        assert!(!cable.carries_power());
    }

    #[test]
    fn enums_parse_from_loose_text() {
        assert_eq!(
            ConductorMaterial::from_str("copper").unwrap(),
            ConductorMaterial::Copper
        );
        assert_eq!(ConductorMaterial::from_str("AL").unwrap(), ConductorMaterial::Aluminium);
        assert_eq!(Insulation::from_str("xlpe").unwrap(), Insulation::Xlpe);
        assert_eq!(
            StartingMethod::from_str("star-delta").unwrap(),
            StartingMethod::StarDelta
        );
        assert_eq!(
            InstallationMethod::from_str("Buried").unwrap(),
            InstallationMethod::BuriedDirect
        );
        assert_eq!(LoadType::from_str("PUMP").unwrap(), LoadType::Pump);
        assert_eq!(ConductorMaterial::Copper.to_string(), "Cu");
        assert_eq!(Insulation::Xlpe.to_string(), "XLPE");
    }

    #[test]
    fn segment_deserializes_with_defaults() {
        let json = r#"{
            "id": "C-7",
            "origin_bus": "P-7",
            "destination_bus": "MCC-1",
            "voltage_v": 415.0,
            "power_kw": 15.0,
            "length_m": 60.0,
            "load_type": "pump",
            "starting_method": "star-delta"
        }"#;
        let segment: CableSegment = serde_json::from_str(json).unwrap();
        assert_eq!(segment.phases, 3);
        assert_eq!(segment.load_type, Some(LoadType::Pump));
        assert_eq!(segment.starting_method, Some(StartingMethod::StarDelta));
        assert!(segment.material.is_none());
    }
}
