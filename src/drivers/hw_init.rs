//! One-shot hardware peripheral initialization.
//!
//! Configures the relay GPIO directions using raw ESP-IDF sys calls.
//! Called once from `main()` before the event loop starts.  Host builds
//! keep pin levels in a bitmask so tests can read them back.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during peripheral initialization or GPIO access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    GpioWriteFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::GpioWriteFailed(rc) => write!(f, "GPIO write failed (rc={})", rc),
        }
    }
}

impl embedded_hal::digital::Error for HwInitError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

// ── Init ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the HTTP server and the
    // event loop exist; single-threaded.
    unsafe { init_relay_outputs()? };
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    for &pin in &pins::RELAY_GPIOS {
        gpio_write(pin, true)?;
    }
    info!("hw_init(sim): relay outputs parked high");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

/// Relay boards are active-low: latch the level high before the pin
/// becomes an output so a relay never clicks at boot.
#[cfg(target_os = "espidf")]
unsafe fn init_relay_outputs() -> Result<(), HwInitError> {
    for &pin in &pins::RELAY_GPIOS {
        let ret = unsafe { gpio_set_level(pin, 1) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioWriteFailed(ret));
        }
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!("hw_init: relay outputs configured {:?}", pins::RELAY_GPIOS);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), HwInitError> {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioWriteFailed(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: AtomicU64 = AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), HwInitError> {
    if !(0..64).contains(&pin) {
        return Err(HwInitError::GpioWriteFailed(pin));
    }
    let bit = 1u64 << pin;
    if high {
        SIM_LEVELS.fetch_or(bit, Ordering::Relaxed);
    } else {
        SIM_LEVELS.fetch_and(!bit, Ordering::Relaxed);
    }
    Ok(())
}

/// Last level written to `pin` (simulation readback).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_level(pin: i32) -> bool {
    (0..64).contains(&pin) && SIM_LEVELS.load(Ordering::Relaxed) & (1u64 << pin) != 0
}
