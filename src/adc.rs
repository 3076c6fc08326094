use std::path::PathBuf;

use rand::{rngs::ThreadRng, thread_rng, Rng};
use thiserror::Error;

use crate::config::SensorConfig;
use crate::model::ABS_ZERO;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} held {text:?}, expected an unsigned count", path.display())]
    Malformed { path: PathBuf, text: String },
}

/// One raw ADC conversion. Called `samples` times per tick, so it has to be
/// cheap and must never block for long.
pub trait AnalogSource {
    fn sample(&mut self) -> Result<u32, SourceError>;
}

impl<T: AnalogSource + ?Sized> AnalogSource for Box<T> {
    fn sample(&mut self) -> Result<u32, SourceError> {
        (**self).sample()
    }
}

/// Raw counts from a Linux IIO ADC channel attribute.
pub struct IioAdc {
    path: PathBuf,
}

impl IioAdc {
    pub fn new(path: PathBuf) -> Self {
        IioAdc { path }
    }
}

impl AnalogSource for IioAdc {
    fn sample(&mut self) -> Result<u32, SourceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        text.trim().parse().map_err(|_| SourceError::Malformed {
            path: self.path.clone(),
            text: text.trim().to_string(),
        })
    }
}

/// Divider counts synthesized from a beta-model thermistor at a slowly
/// wandering ambient temperature, with per-sample jitter.
pub struct SimulatedThermistor {
    sensor: SensorConfig,
    ambient_c: f64,
    drift_c: f64,
    jitter_counts: u32,
    rng: ThreadRng,
}

impl SimulatedThermistor {
    pub fn new(sensor: SensorConfig, ambient_c: f64, jitter_counts: u32) -> Self {
        SimulatedThermistor {
            sensor,
            ambient_c,
            drift_c: 0.0,
            jitter_counts,
            rng: thread_rng(),
        }
    }

    // Inverse of the divider pipeline: celsius -> resistance -> counts.
    fn counts_at(&self, celsius: f64) -> f64 {
        let kelvin = celsius - ABS_ZERO;
        let nominal_kelvin = self.sensor.nominal_temperature_c - ABS_ZERO;
        let resistance = self.sensor.nominal_resistance_ohms
            * (self.sensor.beta_coefficient * (1.0 / kelvin - 1.0 / nominal_kelvin)).exp();
        let full_scale = (self.sensor.supply_voltage / self.sensor.reference_voltage)
            * f64::from(self.sensor.adc_max);
        full_scale * self.sensor.series_resistor_ohms
            / (self.sensor.series_resistor_ohms + resistance)
    }
}

impl AnalogSource for SimulatedThermistor {
    fn sample(&mut self) -> Result<u32, SourceError> {
        self.drift_c = (self.drift_c + self.rng.gen_range(-0.01..=0.01)).clamp(-1.5, 1.5);
        let jitter = if self.jitter_counts == 0 {
            0.0
        } else {
            let bound = f64::from(self.jitter_counts);
            self.rng.gen_range(-bound..=bound)
        };
        let counts = self.counts_at(self.ambient_c + self.drift_c) + jitter;
        Ok(counts.clamp(0.0, f64::from(self.sensor.adc_max)).round() as u32)
    }
}
