//! Relay output pin.
//!
//! A dumb `embedded_hal` output over one GPIO number.  Polarity is not
//! handled here: the relay bank maps logical states to levels, this
//! driver just writes them.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init helpers.
//! On host/test: writes the simulated level register.

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::drivers::hw_init::{self, HwInitError};
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayPin {
    gpio: i32,
}

impl RelayPin {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub const fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Both relay channels in board order.
    pub const fn board() -> [Self; 2] {
        [Self::new(pins::RELAY_GPIOS[0]), Self::new(pins::RELAY_GPIOS[1])]
    }
}

impl ErrorType for RelayPin {
    type Error = HwInitError;
}

impl OutputPin for RelayPin {
    fn set_low(&mut self) -> Result<(), HwInitError> {
        hw_init::gpio_write(self.gpio, false)
    }

    fn set_high(&mut self) -> Result<(), HwInitError> {
        hw_init::gpio_write(self.gpio, true)
    }
}
