use serde::{Serialize, Deserialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::model::{DisplayUnit, ABS_ZERO};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("high setpoint {high} C must be above low setpoint {low} C")]
    SetpointsInverted { high: f64, low: f64 },
    #[error("samples must be at least 1")]
    ZeroSamples,
    #[error("adc_max must be at least 1")]
    ZeroAdcRange,
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("nominal_temperature_c must be above absolute zero, got {0}")]
    NominalBelowAbsoluteZero(f64),
    #[error("tick_interval_ms must be at least 1")]
    ZeroTickInterval,
}

#[derive(Serialize, Deserialize, Debug)]
struct ReadingConfig{
    display_unit: DisplayUnit,
    tick_interval_ms: u64,
    sensor: SensorConfig,
    thermostat: ThermostatConfig,
    source: SourceConfig,
    relay: RelayConfig,
    server: ServerConfig,
}

#[derive(Debug)]
pub struct RunningConfig{
    pub display_unit: DisplayUnit,
    pub tick_interval: Duration,
    pub sensor: SensorConfig,
    pub thresholds: ControlThresholds,
    pub source: SourceConfig,
    pub relay: RelayConfig,
    pub server: ServerConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SensorConfig {
    pub supply_voltage: f64,
    pub reference_voltage: f64,
    pub adc_max: u32,
    pub series_resistor_ohms: f64,
    pub nominal_resistance_ohms: f64,
    pub nominal_temperature_c: f64,
    pub beta_coefficient: f64,
    pub samples: u32,
    pub sample_delay_ms: u64,
    pub model: SensorModelKind,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SensorModelKind {
    SteinhartHart,
    Beta,
}

#[derive(Serialize, Deserialize, Debug)]
struct ThermostatConfig {
    high_setpoint_c: f64,
    low_setpoint_c: f64,
    min_run_secs: u64,
    max_run_secs: u64,
    min_off_secs: u64,
}

/// Setpoints are fixed in celsius no matter what unit the web pages show.
#[derive(Debug, Clone, Copy)]
pub struct ControlThresholds {
    pub high_setpoint_c: f64,
    pub low_setpoint_c: f64,
    pub min_run: Duration,
    pub max_run: Duration,
    pub min_off: Duration,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Synthetic divider counts around a configurable ambient, for bench runs.
    Simulated { ambient_c: f64, jitter_counts: u32 },
    /// Raw counts from a Linux IIO ADC channel, e.g.
    /// /sys/bus/iio/devices/iio:device0/in_voltage0_raw
    Iio { path: PathBuf },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelayConfig {
    /// No hardware attached, transitions only go to the log.
    Logging,
    /// A Linux GPIO value attribute, e.g. /sys/class/gpio/gpio17/value
    SysfsGpio { path: PathBuf },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl RunningConfig{
    pub fn new(file_name: &str) -> Result<RunningConfig, ConfigError>{
        let input_file = std::fs::File::open(file_name)?;
        let init_config: ReadingConfig = serde_yaml::from_reader(input_file)?;
        RunningConfig::validate(init_config)
    }

    fn validate(init_config: ReadingConfig) -> Result<RunningConfig, ConfigError> {
        let sensor = init_config.sensor;
        if sensor.samples == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if sensor.adc_max == 0 {
            return Err(ConfigError::ZeroAdcRange);
        }
        for (field, value) in [
            ("supply_voltage", sensor.supply_voltage),
            ("reference_voltage", sensor.reference_voltage),
            ("series_resistor_ohms", sensor.series_resistor_ohms),
            ("nominal_resistance_ohms", sensor.nominal_resistance_ohms),
            ("beta_coefficient", sensor.beta_coefficient),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if !(sensor.nominal_temperature_c > ABS_ZERO) {
            return Err(ConfigError::NominalBelowAbsoluteZero(sensor.nominal_temperature_c));
        }

        let thermostat = init_config.thermostat;
        if !(thermostat.high_setpoint_c > thermostat.low_setpoint_c) {
            return Err(ConfigError::SetpointsInverted {
                high: thermostat.high_setpoint_c,
                low: thermostat.low_setpoint_c,
            });
        }

        if init_config.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        let tick_interval = Duration::from_millis(init_config.tick_interval_ms);
        let sampling_budget = Duration::from_millis(
            u64::from(sensor.samples.saturating_sub(1)).saturating_mul(sensor.sample_delay_ms),
        );
        if sampling_budget * 2 >= tick_interval {
            log::warn!(
                "one oversampling burst needs at least {:?} of the {:?} tick interval",
                sampling_budget, tick_interval
            );
        }

        let config = RunningConfig{
            display_unit: init_config.display_unit,
            tick_interval,
            sensor,
            thresholds: ControlThresholds {
                high_setpoint_c: thermostat.high_setpoint_c,
                low_setpoint_c: thermostat.low_setpoint_c,
                min_run: Duration::from_secs(thermostat.min_run_secs),
                max_run: Duration::from_secs(thermostat.max_run_secs),
                min_off: Duration::from_secs(thermostat.min_off_secs),
            },
            source: init_config.source,
            relay: init_config.relay,
            server: init_config.server,
        };

        Ok(config)
    }
}
