use std::path::PathBuf;

use thiserror::Error;

use crate::model::{RelayCommand, RelayState};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("cannot drive relay at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Drives the compressor relay coil. Re-applying the current command must be
/// harmless, the controller emits one every tick.
pub trait RelayDriver {
    fn apply(&mut self, command: RelayCommand) -> Result<(), RelayError>;
    fn state(&self) -> RelayState;
}

impl<T: RelayDriver + ?Sized> RelayDriver for Box<T> {
    fn apply(&mut self, command: RelayCommand) -> Result<(), RelayError> {
        (**self).apply(command)
    }

    fn state(&self) -> RelayState {
        (**self).state()
    }
}

/// No coil attached, transitions only show up in the log.
pub struct LoggingRelay {
    state: RelayState,
}

impl LoggingRelay {
    pub fn new() -> Self {
        LoggingRelay { state: RelayState::Off }
    }
}

impl RelayDriver for LoggingRelay {
    fn apply(&mut self, command: RelayCommand) -> Result<(), RelayError> {
        let desired = command.relay_state();
        if desired != self.state {
            log::info!("relay {}", desired.as_str());
            self.state = desired;
        }
        Ok(())
    }

    fn state(&self) -> RelayState {
        self.state
    }
}

/// A relay wired to a sysfs GPIO value attribute, active high.
pub struct SysfsGpioRelay {
    path: PathBuf,
    // unknown until the first write lands
    state: Option<RelayState>,
}

impl SysfsGpioRelay {
    pub fn new(path: PathBuf) -> Self {
        SysfsGpioRelay { path, state: None }
    }
}

impl RelayDriver for SysfsGpioRelay {
    fn apply(&mut self, command: RelayCommand) -> Result<(), RelayError> {
        let desired = command.relay_state();
        if self.state == Some(desired) {
            return Ok(());
        }
        let level: &[u8] = match desired {
            RelayState::On => b"1",
            RelayState::Off => b"0",
        };
        std::fs::write(&self.path, level).map_err(|source| RelayError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!("relay {}", desired.as_str());
        self.state = Some(desired);
        Ok(())
    }

    fn state(&self) -> RelayState {
        self.state.unwrap_or(RelayState::Off)
    }
}
