//! Relay bank: the single owner of relay state.
//!
//! Relays are wired active-low: a logical [`RelayState::On`] drives the
//! pin LOW.  The inversion lives in [`signal_for`] and nowhere else, so
//! the rest of the firmware (and the tests) only ever deal in logical
//! states.
//!
//! The bank caches the logical state of every channel.  The cache is only
//! updated after the pin write succeeded, so it never disagrees with the
//! hardware.

use embedded_hal::digital::{OutputPin, PinState};
use serde::{Deserialize, Serialize};

use crate::error::{ActuatorError, Result};

/// Logical relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    /// Control-request value parsing: `"on"` switches on, anything else off.
    pub fn from_command(value: &str) -> Self {
        if value == "on" { Self::On } else { Self::Off }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

/// Electrical level for a logical state (active-low wiring).
pub const fn signal_for(state: RelayState) -> PinState {
    match state {
        RelayState::On => PinState::Low,
        RelayState::Off => PinState::High,
    }
}

/// Static naming for one relay channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayNames {
    /// Query key accepted by the control route (e.g. `relay1`).
    pub control_key: &'static str,
    /// Field name in status payloads (e.g. `relaySwitch1`).
    pub report_key: &'static str,
}

/// Names of the two relay channels on this board.
pub const RELAY_NAMES: [RelayNames; 2] = [
    RelayNames {
        control_key: "relay1",
        report_key: "relaySwitch1",
    },
    RelayNames {
        control_key: "relay2",
        report_key: "relaySwitch2",
    },
];

/// Fixed-size bank of relays.  Indices are stable for the device lifetime.
pub struct ActuatorBank<P, const N: usize> {
    pins: [P; N],
    states: [RelayState; N],
    names: [RelayNames; N],
}

impl<P: OutputPin, const N: usize> ActuatorBank<P, N> {
    /// Take ownership of the pins and drive every relay OFF.
    pub fn new(pins: [P; N], names: [RelayNames; N]) -> Result<Self> {
        let mut bank = Self {
            pins,
            states: [RelayState::Off; N],
            names,
        };
        for pin in &mut bank.pins {
            pin.set_state(signal_for(RelayState::Off))
                .map_err(|_| ActuatorError::GpioWriteFailed)?;
        }
        Ok(bank)
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Logical state of relay `index`.
    pub fn get(&self, index: usize) -> Result<RelayState> {
        self.states
            .get(index)
            .copied()
            .ok_or_else(|| ActuatorError::IndexOutOfRange(index).into())
    }

    /// Switch relay `index`.  Returns `true` if the logical state changed.
    /// Setting the current state again does not touch the pin.
    pub fn set(&mut self, index: usize, state: RelayState) -> Result<bool> {
        if index >= N {
            return Err(ActuatorError::IndexOutOfRange(index).into());
        }
        if self.states[index] == state {
            return Ok(false);
        }
        self.pins[index]
            .set_state(signal_for(state))
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.states[index] = state;
        Ok(true)
    }

    /// Channel index for a control-route key.
    pub fn index_of_control_key(&self, key: &str) -> Option<usize> {
        self.names.iter().position(|n| n.control_key == key)
    }

    pub fn names(&self, index: usize) -> Result<RelayNames> {
        self.names
            .get(index)
            .copied()
            .ok_or_else(|| ActuatorError::IndexOutOfRange(index).into())
    }

    /// `(report_key, state)` for every channel, in index order.
    pub fn snapshot(&self) -> [(&'static str, RelayState); N] {
        core::array::from_fn(|i| (self.names[i].report_key, self.states[i]))
    }
}
