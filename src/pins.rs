//! GPIO pin assignments for the relay node board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Relay outputs (opto-isolated relay module, active LOW)
// ---------------------------------------------------------------------------

/// Relay channel 1.  Shares the on-board LED on DevKit boards.
pub const RELAY1_GPIO: i32 = 16;
/// Relay channel 2.
pub const RELAY2_GPIO: i32 = 2;

/// All relay outputs in channel order.
pub const RELAY_GPIOS: [i32; 2] = [RELAY1_GPIO, RELAY2_GPIO];
