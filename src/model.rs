use serde::{Serialize, Deserialize};

pub const DEVICE_NAME: &str = "CoolBOX";

// 0 K expressed in degrees Celsius.
pub const ABS_ZERO: f64 = -273.15;

/// A temperature, stored in kelvin. Celsius and Fahrenheit are derived views.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Temperature {
    kelvin: f64,
}

impl Temperature {
    pub fn from_kelvin(kelvin: f64) -> Self {
        Temperature { kelvin }
    }

    pub fn from_celsius(celsius: f64) -> Self {
        Temperature { kelvin: celsius - ABS_ZERO }
    }

    pub fn kelvin(&self) -> f64 {
        self.kelvin
    }

    pub fn celsius(&self) -> f64 {
        self.kelvin + ABS_ZERO
    }

    pub fn fahrenheit(&self) -> f64 {
        self.celsius() * 1.8 + 32.0
    }

    pub fn in_unit(&self, unit: DisplayUnit) -> f64 {
        match unit {
            DisplayUnit::Celsius => self.celsius(),
            DisplayUnit::Fahrenheit => self.fahrenheit(),
        }
    }

    /// True only above 0 K. Conversions that blow up land outside this range.
    pub fn is_physical(&self) -> bool {
        self.kelvin.is_finite() && self.kelvin > 0.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    Celsius,
    Fahrenheit,
}

impl DisplayUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            DisplayUnit::Celsius => "C",
            DisplayUnit::Fahrenheit => "F",
        }
    }
}

/// What the controller wants the relay coil to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    Energize,
    DeEnergize,
}

impl RelayCommand {
    pub fn relay_state(&self) -> RelayState {
        match self {
            RelayCommand::Energize => RelayState::On,
            RelayCommand::DeEnergize => RelayState::Off,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayState::On => "ON",
            RelayState::Off => "OFF",
        }
    }
}

/// One row of status for the web endpoints, already in the display unit.
#[derive(Serialize, Debug)]
pub struct StatusSnapshot {
    pub device: &'static str,
    pub temperature: Option<f64>,
    pub target: f64,
    pub unit: &'static str,
    pub relay: &'static str,
}
