//! Compressor relay control: hysteresis between two setpoints, with timing
//! guards so the compressor never short-cycles.

use std::time::Instant;

use crate::config::ControlThresholds;
use crate::model::{RelayCommand, RelayState, Temperature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// rest_start is None only before the first run, a fresh controller
    /// owes the compressor no rest.
    Idle { rest_start: Option<Instant> },
    Running { cool_start: Instant },
}

pub struct CompressorController {
    thresholds: ControlThresholds,
    phase: Phase,
}

impl CompressorController {
    pub fn new(thresholds: ControlThresholds) -> Self {
        CompressorController {
            thresholds,
            phase: Phase::Idle { rest_start: None },
        }
    }

    /// One control decision. A `None` reading keeps the current phase, the
    /// compressor is never started or stopped on missing data, except that
    /// the maximum run time still trips on the clock alone.
    pub fn tick(&mut self, reading: Option<Temperature>, now: Instant) -> RelayCommand {
        match self.phase {
            Phase::Idle { rest_start } => {
                if let Some(temperature) = reading {
                    if self.too_warm(temperature) && self.rested_long_enough(rest_start, now) {
                        log::info!("compressor on at {:.2} C", temperature.celsius());
                        self.phase = Phase::Running { cool_start: now };
                    }
                }
            }
            Phase::Running { cool_start } => {
                if self.on_too_long(cool_start, now) {
                    log::warn!("compressor off, max run time reached");
                    self.phase = Phase::Idle { rest_start: Some(now) };
                } else if let Some(temperature) = reading {
                    if self.too_cold(temperature) && self.on_long_enough(cool_start, now) {
                        log::info!("compressor off at {:.2} C", temperature.celsius());
                        self.phase = Phase::Idle { rest_start: Some(now) };
                    }
                }
            }
        }
        self.command()
    }

    pub fn command(&self) -> RelayCommand {
        match self.phase {
            Phase::Idle { .. } => RelayCommand::DeEnergize,
            Phase::Running { .. } => RelayCommand::Energize,
        }
    }

    pub fn relay_state(&self) -> RelayState {
        self.command().relay_state()
    }

    fn too_warm(&self, temperature: Temperature) -> bool {
        temperature.celsius() >= self.thresholds.high_setpoint_c
    }

    fn too_cold(&self, temperature: Temperature) -> bool {
        temperature.celsius() <= self.thresholds.low_setpoint_c
    }

    fn rested_long_enough(&self, rest_start: Option<Instant>, now: Instant) -> bool {
        match rest_start {
            None => true,
            Some(start) => now.duration_since(start) >= self.thresholds.min_off,
        }
    }

    fn on_long_enough(&self, cool_start: Instant, now: Instant) -> bool {
        now.duration_since(cool_start) >= self.thresholds.min_run
    }

    fn on_too_long(&self, cool_start: Instant, now: Instant) -> bool {
        now.duration_since(cool_start) >= self.thresholds.max_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_thresholds() -> ControlThresholds {
        ControlThresholds {
            high_setpoint_c: 19.0,
            low_setpoint_c: 17.0,
            min_run: Duration::from_secs(120),
            max_run: Duration::from_secs(3600),
            min_off: Duration::from_secs(600),
        }
    }

    fn celsius(value: f64) -> Option<Temperature> {
        Some(Temperature::from_celsius(value))
    }

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    #[test]
    fn engages_immediately_after_boot_when_too_warm() {
        // fresh controller, 20 C >= 19 C: no rest owed, compressor starts
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        assert_eq!(RelayCommand::Energize, controller.tick(celsius(20.0), t0));
        assert_eq!(Phase::Running { cool_start: t0 }, controller.phase);
    }

    #[test]
    fn stays_idle_inside_the_hysteresis_band() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        // 18 C sits between the setpoints, nothing to do
        assert_eq!(RelayCommand::DeEnergize, controller.tick(celsius(18.0), t0));
        assert_eq!(RelayCommand::DeEnergize, controller.tick(celsius(18.0), t0 + secs(1)));
        assert_eq!(Phase::Idle { rest_start: None }, controller.phase);
    }

    #[test]
    fn keeps_running_until_the_minimum_run_time_passes() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        controller.tick(celsius(20.0), t0);
        // 30 s in and already below the low setpoint: must keep running
        assert_eq!(RelayCommand::Energize, controller.tick(celsius(16.0), t0 + secs(30)));
        assert_eq!(Phase::Running { cool_start: t0 }, controller.phase);
        // 119 s, still inside the minimum run window
        assert_eq!(RelayCommand::Energize, controller.tick(celsius(16.0), t0 + secs(119)));
    }

    #[test]
    fn disengages_once_cold_and_past_the_minimum_run_time() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        controller.tick(celsius(20.0), t0);
        controller.tick(celsius(16.0), t0 + secs(30));
        // 121 s >= 120 s and 16 C <= 17 C: stop, rest starts now
        assert_eq!(RelayCommand::DeEnergize, controller.tick(celsius(16.0), t0 + secs(121)));
        assert_eq!(
            Phase::Idle { rest_start: Some(t0 + secs(121)) },
            controller.phase
        );
    }

    #[test]
    fn waits_out_the_minimum_off_time_before_restarting() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        controller.tick(celsius(20.0), t0);
        controller.tick(celsius(16.0), t0 + secs(121));
        // warm again 599 s into the rest: one second short, stays off
        assert_eq!(
            RelayCommand::DeEnergize,
            controller.tick(celsius(20.0), t0 + secs(121 + 599))
        );
        // 600 s of rest done, restart
        assert_eq!(
            RelayCommand::Energize,
            controller.tick(celsius(20.0), t0 + secs(121 + 600))
        );
        assert_eq!(
            Phase::Running { cool_start: t0 + secs(121 + 600) },
            controller.phase
        );
    }

    #[test]
    fn forces_off_at_the_maximum_run_time_even_when_warm() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        controller.tick(celsius(25.0), t0);
        assert_eq!(RelayCommand::Energize, controller.tick(celsius(25.0), t0 + secs(3599)));
        // pinned at 25 C, the clock still wins at 3600 s
        assert_eq!(RelayCommand::DeEnergize, controller.tick(celsius(25.0), t0 + secs(3600)));
        assert_eq!(
            Phase::Idle { rest_start: Some(t0 + secs(3600)) },
            controller.phase
        );
    }

    #[test]
    fn unmet_conditions_leave_timestamps_untouched() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        controller.tick(celsius(20.0), t0);
        // neither cold nor timed out: cool_start must not move
        for n in 1..5 {
            assert_eq!(RelayCommand::Energize, controller.tick(celsius(18.0), t0 + secs(n * 200)));
            assert_eq!(Phase::Running { cool_start: t0 }, controller.phase);
        }
        // stop, then poke the idle phase with in-band readings
        controller.tick(celsius(16.0), t0 + secs(1000));
        for n in 1..5 {
            assert_eq!(RelayCommand::DeEnergize, controller.tick(celsius(18.0), t0 + secs(1000 + n)));
            assert_eq!(
                Phase::Idle { rest_start: Some(t0 + secs(1000)) },
                controller.phase
            );
        }
    }

    #[test]
    fn stays_off_during_rest_whatever_the_temperature() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        controller.tick(celsius(20.0), t0);
        controller.tick(celsius(16.0), t0 + secs(121));
        // even absurdly hot readings cannot cut the rest short
        for value in [19.0, 25.0, 40.0, 90.0] {
            assert_eq!(
                RelayCommand::DeEnergize,
                controller.tick(celsius(value), t0 + secs(121 + 300))
            );
        }
    }

    #[test]
    fn faulted_reading_holds_the_current_phase() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        // idle stays idle
        assert_eq!(RelayCommand::DeEnergize, controller.tick(None, t0));
        assert_eq!(Phase::Idle { rest_start: None }, controller.phase);
        // running stays running, timestamp intact
        controller.tick(celsius(20.0), t0 + secs(1));
        assert_eq!(RelayCommand::Energize, controller.tick(None, t0 + secs(500)));
        assert_eq!(Phase::Running { cool_start: t0 + secs(1) }, controller.phase);
    }

    #[test]
    fn faulted_reading_still_trips_the_maximum_run_time() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        controller.tick(celsius(25.0), t0);
        assert_eq!(RelayCommand::Energize, controller.tick(None, t0 + secs(3599)));
        assert_eq!(RelayCommand::DeEnergize, controller.tick(None, t0 + secs(3600)));
        assert_eq!(
            Phase::Idle { rest_start: Some(t0 + secs(3600)) },
            controller.phase
        );
    }

    #[test]
    fn boundary_comparisons_are_inclusive() {
        let t0 = Instant::now();
        let mut controller = CompressorController::new(test_thresholds());
        // exactly 19 C counts as too warm
        assert_eq!(RelayCommand::Energize, controller.tick(celsius(19.0), t0));
        // exactly 17 C at exactly 120 s counts as done
        assert_eq!(RelayCommand::DeEnergize, controller.tick(celsius(17.0), t0 + secs(120)));
    }
}
