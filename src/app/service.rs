//! Application service: the hexagonal core.
//!
//! [`NodeService`] owns the relay bank and the status reporter, so the
//! control path and the reporting path always see the same relay state.
//! Time comes from an injected [`Clock`], network identity from the
//! [`LinkState`] the main loop hands in, and events leave through an
//! [`EventSink`] passed at each call site.
//!
//! ```text
//!   HTTP routes ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                   │         NodeService          │
//!   Scheduler   ──▶ │  ActuatorBank · Reporter     │ ──▶ Connector (hub)
//!                   └──────────────────────────────┘
//! ```
//!
//! On device the service sits behind a `Mutex`: HTTP handlers run on the
//! server task, the scheduler on the main task, and both may report.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::clock::Clock;
use crate::config::NodeConfig;
use crate::error::Result;

use super::commands::{AppCommand, AppReply, ControlReply, StatusReply};
use super::events::{AppEvent, ReportTrigger};
use super::ports::{Connector, EventSink, LinkState};
use super::relays::{ActuatorBank, RelayState};
use super::reporter::{DeliveryOutcome, StatusReporter};

/// The application service orchestrates all domain logic.
pub struct NodeService<P, T, C, const N: usize> {
    relays: ActuatorBank<P, N>,
    reporter: StatusReporter<T>,
    clock: C,
    link: LinkState,
    greeting: heapless::String<32>,
}

impl<P, T, C, const N: usize> NodeService<P, T, C, N>
where
    P: OutputPin,
    T: Connector,
    C: Clock,
{
    pub fn new(relays: ActuatorBank<P, N>, connector: T, clock: C, config: &NodeConfig) -> Self {
        Self {
            relays,
            reporter: StatusReporter::from_config(connector, config),
            clock,
            link: LinkState::down(),
            greeting: config.greeting.clone(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started { relays: N });
        info!("NodeService started with {} relays", N);
    }

    /// Update the network identity used in reports.
    pub fn set_link(&mut self, link: LinkState) {
        if link != self.link {
            info!("NodeService: link {:?} -> {:?}", self.link, link);
        }
        self.link = link;
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (HTTP route, scheduler).
    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> Result<AppReply> {
        match cmd {
            AppCommand::Control(pairs) => {
                let pairs: Vec<(&str, &str)> =
                    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                self.handle_control(&pairs, sink).map(AppReply::Control)
            }
            AppCommand::QueryStatus => Ok(AppReply::Status(self.handle_status_query())),
            AppCommand::Refresh => Ok(AppReply::Refreshed(self.handle_refresh(sink))),
        }
    }

    /// Apply every recognised `(control key, value)` pair, then push one
    /// status report if any relay actually changed.  Unknown keys are
    /// skipped; a key repeated in one request keeps its last value.
    ///
    /// The outcome of the push never affects the result: a dead hub does
    /// not make relay control fail.  A pin write failure stops the
    /// remaining keys, but relays already switched are still reported
    /// before the error is returned.
    pub fn handle_control(
        &mut self,
        pairs: &[(&str, &str)],
        sink: &mut impl EventSink,
    ) -> Result<ControlReply> {
        let mut reply = ControlReply::default();
        let mut mutated = false;
        let mut failure = None;

        for &(key, value) in pairs {
            let Some(index) = self.relays.index_of_control_key(key) else {
                continue;
            };
            let state = RelayState::from_command(value);
            let changed = match self.relays.set(index, state) {
                Ok(changed) => changed,
                Err(e) => {
                    warn!("Control: {} = {:?} failed: {}", key, state, e);
                    failure = Some(e);
                    break;
                }
            };
            let name = self.relays.names(index)?.report_key;
            if changed {
                mutated = true;
                sink.emit(&AppEvent::RelayChanged { name, state });
            }
            reply.record(name, state);
        }

        if mutated {
            reply.report = Some(self.report(ReportTrigger::Control, sink));
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(reply),
        }
    }

    /// Current relay states plus the fixed greeting.
    pub fn handle_status_query(&self) -> StatusReply {
        StatusReply {
            message: self.greeting.clone(),
            relays: self.relays.snapshot().to_vec(),
        }
    }

    /// Push a report now, independent of the schedule.
    pub fn handle_refresh(&mut self, sink: &mut impl EventSink) -> DeliveryOutcome {
        self.report(ReportTrigger::Refresh, sink)
    }

    /// The single entry point for status pushes.
    pub fn report(&mut self, trigger: ReportTrigger, sink: &mut impl EventSink) -> DeliveryOutcome {
        let outcome = self.reporter.attempt(&self.relays, &self.clock, self.link);
        if outcome == DeliveryOutcome::TransportFailed {
            warn!("Report ({:?}) failed", trigger);
        }
        sink.emit(&AppEvent::Report {
            trigger,
            outcome,
            consecutive_failures: self.reporter.policy().consecutive_failures(),
        });
        outcome
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn relays(&self) -> &ActuatorBank<P, N> {
        &self.relays
    }

    /// Direct relay access for boot-time wiring and tests.
    pub fn relays_mut(&mut self) -> &mut ActuatorBank<P, N> {
        &mut self.relays
    }

    pub fn reporter(&self) -> &StatusReporter<T> {
        &self.reporter
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
