//! RelayNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod pins;
pub mod scheduler;
pub mod uptime;

// Adapters and drivers carry simulation stubs so the crate builds on the
// host; the device implementations are cfg-gated inside.
pub mod adapters;
pub mod drivers;
