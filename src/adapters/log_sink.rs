//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::app::reporter::DeliveryOutcome;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { relays } => {
                info!("START | relays={} all=off", relays);
            }
            AppEvent::RelayChanged { name, state } => {
                info!("RELAY | {}={}", name, state.as_str());
            }
            AppEvent::Report {
                trigger,
                outcome: outcome @ DeliveryOutcome::TransportFailed,
                consecutive_failures,
            } => {
                warn!(
                    "REPORT | trigger={:?} outcome={} failures={}",
                    trigger,
                    outcome.as_str(),
                    consecutive_failures
                );
            }
            AppEvent::Report {
                trigger,
                outcome,
                consecutive_failures,
            } => {
                info!(
                    "REPORT | trigger={:?} outcome={} failures={}",
                    trigger,
                    outcome.as_str(),
                    consecutive_failures
                );
            }
        }
    }
}
