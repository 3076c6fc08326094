use std::{env, process};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use env_logger::Env;
use tokio::sync::mpsc;
use tokio::time::interval;

mod adc;
mod compressor;
mod config;
mod model;
mod relay;
mod server;
mod state;
mod thermistor;

use crate::adc::{AnalogSource, IioAdc, SimulatedThermistor};
use crate::compressor::CompressorController;
use crate::config::{RelayConfig, RunningConfig, SourceConfig};
use crate::model::{RelayCommand, DEVICE_NAME};
use crate::relay::{LoggingRelay, RelayDriver, SysfsGpioRelay};
use crate::state::State;
use crate::thermistor::Thermistor;

#[tokio::main]
async fn main() {
    // Initialize the logger from the environment
    let env = Env::default()
        .filter_or("COOLBOX_LOG_LEVEL", "info")
        .write_style_or("COOLBOX_LOG_STYLE", "always");

    env_logger::init_from_env(env);

    let config_file = env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());

    // /reset tears the run down and we come back around for a fresh config read
    loop {
        let config = RunningConfig::new(&config_file).unwrap_or_else(|e| {
            log::error!("cannot start with {}: {}", config_file, e);
            process::exit(1);
        });
        log::info!("{} starting, listening on {}", DEVICE_NAME, config.server.listen);
        log::debug!("{:?}", config);
        run(config).await;
        log::info!("reinitializing");
    }
}

async fn run(config: RunningConfig) {
    let source: Box<dyn AnalogSource> = match config.source.clone() {
        SourceConfig::Simulated { ambient_c, jitter_counts } => {
            Box::new(SimulatedThermistor::new(config.sensor, ambient_c, jitter_counts))
        }
        SourceConfig::Iio { path } => Box::new(IioAdc::new(path)),
    };
    let mut sensor = Thermistor::new(source, config.sensor);
    let mut controller = CompressorController::new(config.thresholds);
    let mut relay: Box<dyn RelayDriver> = match config.relay.clone() {
        RelayConfig::Logging => Box::new(LoggingRelay::new()),
        RelayConfig::SysfsGpio { path } => Box::new(SysfsGpioRelay::new(path)),
    };

    // the coil starts dropped, matching the controller's idle boot phase
    if let Err(e) = relay.apply(RelayCommand::DeEnergize) {
        log::error!("{}", e);
    }

    let state = Arc::new(Mutex::new(State::new(
        config.display_unit,
        config.thresholds.high_setpoint_c,
    )));
    // restart_tx outlives the web task, recv fires only on an explicit /reset
    let (restart_tx, mut restart_rx) = mpsc::channel(1);
    let web_server = server::set_up_web_server(state.clone(), restart_tx.clone(), config.server.listen);

    let mut ticker = interval(config.tick_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reading = match sensor.read().await {
                    Ok(temperature) => Some(temperature),
                    Err(e) => {
                        log::warn!("sensor fault, holding the last command: {}", e);
                        None
                    }
                };
                let command = controller.tick(reading, Instant::now());
                if let Err(e) = relay.apply(command) {
                    log::error!("{}", e);
                }
                let mut state_lock = state.lock().unwrap();
                match reading {
                    Some(temperature) => state_lock.update(temperature, controller.relay_state()),
                    None => state_lock.update_relay(controller.relay_state()),
                }
            }
            _ = restart_rx.recv() => {
                break;
            }
        }
    }

    web_server.abort();
    // wait until the old listener is gone, the next run binds the same port
    let _ = web_server.await;
}
