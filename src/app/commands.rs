//! Inbound commands to the application service, and their replies.
//!
//! These represent actions requested by the outside world (HTTP routes,
//! the scheduler) that the [`NodeService`](super::service::NodeService)
//! interprets and acts upon.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::relays::RelayState;
use super::reporter::DeliveryOutcome;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Switch relays: `(control key, value)` pairs, value `"on"` or
    /// anything else for off.  Unknown keys are ignored.
    Control(Vec<(String, String)>),

    /// Read relay states.  Never touches the network.
    QueryStatus,

    /// Push a status report now, outside the schedule.
    Refresh,
}

/// Relays a control command actually applied, by report key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlReply {
    pub applied: Vec<(&'static str, RelayState)>,
    /// Outcome of the push triggered by the change, if any relay changed.
    pub report: Option<DeliveryOutcome>,
}

impl ControlReply {
    /// Note `name` as applied; a later value for the same relay replaces
    /// the earlier one.
    pub fn record(&mut self, name: &'static str, state: RelayState) {
        match self.applied.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = state,
            None => self.applied.push((name, state)),
        }
    }
}

impl Serialize for ControlReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.applied.len()))?;
        for (name, state) in &self.applied {
            map.serialize_entry(name, state)?;
        }
        map.end()
    }
}

/// Greeting plus current relay states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReply {
    pub message: heapless::String<32>,
    pub relays: Vec<(&'static str, RelayState)>,
}

impl Serialize for StatusReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.relays.len() + 1))?;
        map.serialize_entry("message", self.message.as_str())?;
        for (name, state) in &self.relays {
            map.serialize_entry(name, state)?;
        }
        map.end()
    }
}

/// Reply to an [`AppCommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppReply {
    Control(ControlReply),
    Status(StatusReply),
    Refreshed(DeliveryOutcome),
}
