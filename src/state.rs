use crate::model::{DisplayUnit, RelayState, StatusSnapshot, Temperature, DEVICE_NAME};

#[derive(Debug)]
pub struct State {
  unit: DisplayUnit,
  target_c: f64,
  last_temperature: Option<Temperature>,
  relay: RelayState,
}


impl State {
  pub fn new(unit: DisplayUnit, target_c: f64) -> Self {
    State {
      unit,
      target_c,
      last_temperature: None,
      relay: RelayState::Off,
    }
  }
  pub fn update(&mut self, temperature: Temperature, relay: RelayState) {
    self.last_temperature = Some(temperature);
    self.relay = relay;
    log::debug!(
      "temperature {:.2} {}, relay {}",
      temperature.in_unit(self.unit),
      self.unit.symbol(),
      relay.as_str()
    );
  }
  // a faulted tick carries no temperature but the relay may still have moved
  pub fn update_relay(&mut self, relay: RelayState) {
    self.relay = relay;
    log::debug!("no fresh temperature, relay {}", relay.as_str());
  }

  pub fn current_temperature(&self) -> Option<f64> {
    self.last_temperature.map(|t| t.in_unit(self.unit))
  }

  pub fn relay_state(&self) -> RelayState {
    self.relay
  }

  pub fn snapshot(&self) -> StatusSnapshot {
    StatusSnapshot {
      device: DEVICE_NAME,
      temperature: self.current_temperature(),
      target: Temperature::from_celsius(self.target_c).in_unit(self.unit),
      unit: self.unit.symbol(),
      relay: self.relay.as_str(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn snapshot_before_first_reading_has_no_temperature() {
    let state = State::new(DisplayUnit::Celsius, 19.0);
    let json = serde_json::to_value(state.snapshot()).unwrap();
    assert_eq!("CoolBOX", json["device"]);
    assert_eq!(serde_json::Value::Null, json["temperature"]);
    assert_eq!("C", json["unit"]);
    assert_eq!("OFF", json["relay"]);
  }

  #[test]
  fn snapshot_converts_to_the_display_unit() {
    let mut state = State::new(DisplayUnit::Fahrenheit, 19.0);
    state.update(Temperature::from_celsius(25.0), RelayState::On);
    let snapshot = state.snapshot();
    // 25 C = 77 F, the 19 C target shows as 66.2 F
    assert!((snapshot.temperature.unwrap() - 77.0).abs() < 1e-9);
    assert!((snapshot.target - 66.2).abs() < 1e-9);
    assert_eq!("F", snapshot.unit);
    assert_eq!("ON", snapshot.relay);
  }

  #[test]
  fn relay_updates_survive_missing_readings() {
    let mut state = State::new(DisplayUnit::Celsius, 19.0);
    state.update(Temperature::from_celsius(20.0), RelayState::On);
    state.update_relay(RelayState::Off);
    assert_eq!(RelayState::Off, state.relay_state());
    // the stale temperature stays on display
    assert!((state.current_temperature().unwrap() - 20.0).abs() < 1e-9);
  }
}
