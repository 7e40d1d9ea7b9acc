//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.

use super::relays::RelayState;
use super::reporter::DeliveryOutcome;

/// What caused a status push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTrigger {
    /// The periodic schedule fired.
    Scheduled,
    /// A control command changed relays.
    Control,
    /// Explicit refresh request.
    Refresh,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service is up with this many relay channels, all off.
    Started { relays: usize },

    /// A relay was commanded through the control route.
    RelayChanged {
        name: &'static str,
        state: RelayState,
    },

    /// A status push finished (or was skipped).
    Report {
        trigger: ReportTrigger,
        outcome: DeliveryOutcome,
        consecutive_failures: u8,
    },
}
