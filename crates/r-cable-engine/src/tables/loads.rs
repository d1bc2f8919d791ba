//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Load-type defaults, voltage-drop limits and motor starting data."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use crate::model::{LoadType, ProtectiveDevice, StartingMethod};

/// Typical electrical characteristics of a load class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadProfile {
    pub power_factor: f64,
    pub efficiency: f64,
    /// Permitted running voltage drop on the cable (% of nominal).
    pub running_drop_limit_percent: f64,
}

/// Starting behaviour of a motor starter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartingProfile {
    /// Starting current as a multiple of full-load current.
    pub current_multiplier: f64,
    /// Power factor during acceleration; `None` keeps the running value.
    pub power_factor: Option<f64>,
    /// Permitted voltage drop while starting (% of nominal).
    pub drop_limit_percent: f64,
}

pub const fn load_profile(load_type: LoadType) -> LoadProfile {
    match load_type {
        LoadType::Motor => LoadProfile {
            power_factor: 0.85,
            efficiency: 0.92,
            running_drop_limit_percent: 3.0,
        },
        LoadType::Pump => LoadProfile {
            power_factor: 0.85,
            efficiency: 0.90,
            running_drop_limit_percent: 3.0,
        },
        LoadType::Fan => LoadProfile {
            power_factor: 0.82,
            efficiency: 0.88,
            running_drop_limit_percent: 3.0,
        },
        LoadType::Compressor => LoadProfile {
            power_factor: 0.86,
            efficiency: 0.91,
            running_drop_limit_percent: 3.0,
        },
        LoadType::Heater => LoadProfile {
            power_factor: 1.0,
            efficiency: 1.0,
            running_drop_limit_percent: 5.0,
        },
        LoadType::Transformer => LoadProfile {
            power_factor: 0.90,
            efficiency: 0.98,
            running_drop_limit_percent: 4.0,
        },
        LoadType::Feeder => LoadProfile {
            power_factor: 0.90,
            efficiency: 1.0,
            running_drop_limit_percent: 5.0,
        },
    }
}

pub const fn starting_profile(method: StartingMethod) -> StartingProfile {
    match method {
        StartingMethod::Dol => StartingProfile {
            current_multiplier: 6.0,
            power_factor: Some(0.30),
            drop_limit_percent: 15.0,
        },
        StartingMethod::StarDelta => StartingProfile {
            current_multiplier: 2.0,
            power_factor: Some(0.35),
            drop_limit_percent: 12.0,
        },
        StartingMethod::SoftStarter => StartingProfile {
            current_multiplier: 3.0,
            power_factor: Some(0.40),
            drop_limit_percent: 10.0,
        },
        StartingMethod::Vfd => StartingProfile {
            current_multiplier: 1.2,
            power_factor: None,
            drop_limit_percent: 5.0,
        },
    }
}

/// Clearing time (s) assumed when a device type is known but no time was supplied.
pub const fn default_clearing_time(device: ProtectiveDevice) -> f64 {
    match device {
        ProtectiveDevice::Mcb => 0.1,
        ProtectiveDevice::Mccb => 0.2,
        ProtectiveDevice::Acb => 0.5,
        ProtectiveDevice::Fuse => 0.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motors_have_stricter_running_limits_than_resistive_loads() {
        let heater = load_profile(LoadType::Heater).running_drop_limit_percent;
        for motor in [
            LoadType::Motor,
            LoadType::Pump,
            LoadType::Fan,
            LoadType::Compressor,
        ] {
            assert!(load_profile(motor).running_drop_limit_percent < heater);
        }
    }

    #[test]
    fn load_defaults_are_not_a_single_constant() {
        let motor = load_profile(LoadType::Motor);
        let heater = load_profile(LoadType::Heater);
        let fan = load_profile(LoadType::Fan);
        assert_ne!(motor.power_factor, heater.power_factor);
        assert_ne!(motor.efficiency, fan.efficiency);
    }

    #[test]
    fn dol_starting_is_the_most_severe() {
        let dol = starting_profile(StartingMethod::Dol).current_multiplier;
        for method in [
            StartingMethod::StarDelta,
            StartingMethod::SoftStarter,
            StartingMethod::Vfd,
        ] {
            assert!(starting_profile(method).current_multiplier < dol);
        }
    }
}
