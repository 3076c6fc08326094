//! NTC thermistor on the high side of a voltage divider, sampled through
//! an ADC. One reading is the mean of a burst of consecutive conversions.

use std::time::Duration;
use thiserror::Error;

use crate::adc::{AnalogSource, SourceError};
use crate::config::{SensorConfig, SensorModelKind};
use crate::model::{Temperature, ABS_ZERO};

// Steinhart-Hart coefficients fitted for the stock 10k NTC probe.
const STEINHART_A: f64 = 1.009249522e-03;
const STEINHART_B: f64 = 2.378405444e-04;
const STEINHART_C: f64 = 2.019202697e-07;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("analog source: {0}")]
    Source(#[from] SourceError),
    #[error("open thermistor circuit: divider read {counts:.1} counts")]
    OpenCircuit { counts: f64 },
    #[error("shorted thermistor circuit: divider read {counts:.1} counts")]
    ShortCircuit { counts: f64 },
    #[error("implausible conversion: {resistance:.0} ohm gave {kelvin:.2} K")]
    NotPhysical { resistance: f64, kelvin: f64 },
}

/// Mean counts of one oversampling burst, before any conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading(pub f64);

/// Resistance-to-kelvin curve. Selected once from the sensor config so the
/// rest of the pipeline never cares which model is in use.
#[derive(Debug, Clone, Copy)]
pub enum SensorModel {
    SteinhartHart { a: f64, b: f64, c: f64 },
    Beta { nominal_resistance: f64, nominal_kelvin: f64, beta: f64 },
}

impl SensorModel {
    pub fn from_config(sensor: &SensorConfig) -> Self {
        match sensor.model {
            SensorModelKind::SteinhartHart => SensorModel::SteinhartHart {
                a: STEINHART_A,
                b: STEINHART_B,
                c: STEINHART_C,
            },
            SensorModelKind::Beta => SensorModel::Beta {
                nominal_resistance: sensor.nominal_resistance_ohms,
                nominal_kelvin: sensor.nominal_temperature_c - ABS_ZERO,
                beta: sensor.beta_coefficient,
            },
        }
    }

    // Callers guard the divider output, resistance is positive and finite here.
    pub fn kelvin_from_resistance(&self, resistance: f64) -> f64 {
        match *self {
            SensorModel::SteinhartHart { a, b, c } => {
                // 1/K = a + b ln(r) + c ln(r)^3
                let ln_r = resistance.ln();
                1.0 / (a + b * ln_r + c * ln_r.powi(3))
            }
            SensorModel::Beta { nominal_resistance, nominal_kelvin, beta } => {
                // 1/K = 1/K0 + ln(r/r0) / beta
                1.0 / (1.0 / nominal_kelvin + (resistance / nominal_resistance).ln() / beta)
            }
        }
    }
}

pub struct Thermistor<A> {
    source: A,
    sensor: SensorConfig,
    model: SensorModel,
}

impl<A: AnalogSource> Thermistor<A> {
    pub fn new(source: A, sensor: SensorConfig) -> Self {
        let model = SensorModel::from_config(&sensor);
        Thermistor { source, sensor, model }
    }

    pub async fn read(&mut self) -> Result<Temperature, SensorError> {
        let raw = self.read_raw().await?;
        let temperature = self.to_kelvin(raw)?;
        log::debug!("adc mean {:.1} counts -> {:.2} K", raw.0, temperature.kelvin());
        Ok(temperature)
    }

    /// Mean of `samples` conversions with a fixed pause between consecutive ones.
    pub async fn read_raw(&mut self) -> Result<RawReading, SensorError> {
        let mut sum: u64 = 0;
        for n in 0..self.sensor.samples {
            if n > 0 {
                tokio::time::sleep(Duration::from_millis(self.sensor.sample_delay_ms)).await;
            }
            sum += u64::from(self.source.sample()?);
        }
        Ok(RawReading(sum as f64 / f64::from(self.sensor.samples)))
    }

    pub fn to_kelvin(&self, raw: RawReading) -> Result<Temperature, SensorError> {
        // NTC on top of the divider: counts grow as the thermistor shrinks.
        // r = series * ((vcc / vref) * adc_max / counts - 1)
        let full_scale = (self.sensor.supply_voltage / self.sensor.reference_voltage)
            * f64::from(self.sensor.adc_max);
        let resistance = self.sensor.series_resistor_ohms * (full_scale / raw.0 - 1.0);
        if !resistance.is_finite() {
            return Err(SensorError::OpenCircuit { counts: raw.0 });
        }
        if resistance <= 0.0 {
            return Err(SensorError::ShortCircuit { counts: raw.0 });
        }
        let kelvin = self.model.kelvin_from_resistance(resistance);
        let temperature = Temperature::from_kelvin(kelvin);
        if !temperature.is_physical() {
            return Err(SensorError::NotPhysical { resistance, kelvin });
        }
        Ok(temperature)
    }
}
