//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the relay node: relay
//! ownership, the hub status reporter and its failure policy, and the
//! service facade that HTTP routes and the scheduler call into.
//! All interaction with the network and the clock happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable on the
//! host.

pub mod commands;
pub mod events;
pub mod payload;
pub mod policy;
pub mod ports;
pub mod relays;
pub mod reporter;
pub mod service;
