//! Status reporter: pushes relay state and device health to the hub.
//!
//! One [`attempt`](StatusReporter::attempt) is one blocking exchange with
//! two bounded waits (connect, reply window), so it can never stall the
//! main loop for more than `connect_timeout_ms + read_timeout_ms` plus
//! the write.
//!
//! ```text
//!  policy ── Suppressed ─────────────────────────────────▶ return
//!    │ allowed
//!    ▼   (link down counts as a failed connect)
//!  snapshot relays + uptime + ip ─▶ connect ── fail ─▶ record_failure ─▶ TransportFailed
//!                                     │ ok
//!                                     ▼
//!                           POST / ─▶ read first line (deadline on Clock)
//!                                     │
//!                       2xx ─▶ Sent{ack}   other / silence ─▶ Sent{no ack}
//! ```
//!
//! Nothing in here returns an error: every failure is absorbed into the
//! [`DeliveryOutcome`] and the failure policy.

use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use super::payload::{StatusPayload, frame_post, parse_status_code};
use super::policy::{Admission, FailurePolicy};
use super::ports::{Connection, Connector, LinkState, TransportError};
use super::relays::ActuatorBank;
use crate::clock::{Clock, elapsed_since};
use crate::config::{NodeConfig, PROJECT_NAME};
use crate::uptime::format_uptime;

/// Reply bytes kept while looking for the status line.
const REPLY_BUF_LEN: usize = 128;

/// Result of one reporting attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Request was written.  `acknowledged` is `true` only for a 2xx reply
    /// seen inside the read window.
    Sent { acknowledged: bool },
    /// No connection, or the connection broke while sending.
    TransportFailed,
    /// The failure policy skipped this attempt; no network activity.
    Suppressed,
}

impl DeliveryOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent { acknowledged: true } => "acknowledged",
            Self::Sent { acknowledged: false } => "sent",
            Self::TransportFailed => "failed",
            Self::Suppressed => "suppressed",
        }
    }
}

/// Where and how patiently to push.
#[derive(Debug, Clone)]
pub struct HubEndpoint {
    pub host: heapless::String<64>,
    pub port: u16,
    pub connect_timeout_ms: u32,
    pub read_timeout_ms: u32,
}

impl HubEndpoint {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            host: config.hub_host.clone(),
            port: config.hub_port,
            connect_timeout_ms: config.connect_timeout_ms,
            read_timeout_ms: config.read_timeout_ms,
        }
    }
}

pub struct StatusReporter<T> {
    connector: T,
    endpoint: HubEndpoint,
    policy: FailurePolicy,
}

impl<T: Connector> StatusReporter<T> {
    pub fn new(connector: T, endpoint: HubEndpoint, policy: FailurePolicy) -> Self {
        Self {
            connector,
            endpoint,
            policy,
        }
    }

    pub fn from_config(connector: T, config: &NodeConfig) -> Self {
        Self::new(
            connector,
            HubEndpoint::from_config(config),
            FailurePolicy::new(config.failure_threshold, config.failure_cooldown_ms),
        )
    }

    pub fn policy(&self) -> &FailurePolicy {
        &self.policy
    }

    /// Build the payload from the live relay bank and push it once.
    pub fn attempt<P: OutputPin, const N: usize>(
        &mut self,
        relays: &ActuatorBank<P, N>,
        clock: &impl Clock,
        link: LinkState,
    ) -> DeliveryOutcome {
        let started = clock.now();
        let admission = self.policy.admit(started);
        if !admission.is_allowed() {
            debug!("Report: suppressed by failure policy");
            return DeliveryOutcome::Suppressed;
        }

        if !link.connected {
            warn!("Report: link down, not attempting hub push");
            self.policy.record_failure(started);
            return DeliveryOutcome::TransportFailed;
        }

        let payload = StatusPayload {
            relays: relays.snapshot(),
            uptime: format_uptime(clock.uptime_ms()),
            ip: link.ip_or_unspecified(),
        };
        let body = payload.to_json();

        let ep = &self.endpoint;
        let mut conn = match self.connector.connect(&ep.host, ep.port, ep.connect_timeout_ms) {
            Ok(c) => c,
            Err(e) => {
                warn!("Report: connect to {}:{} failed ({})", ep.host, ep.port, e);
                self.policy.record_failure(clock.now());
                return DeliveryOutcome::TransportFailed;
            }
        };

        let request = frame_post(&ep.host, ep.port, PROJECT_NAME, &body);
        if let Err(e) = conn.write_all(request.as_bytes()) {
            warn!("Report: send failed ({})", e);
            self.policy.record_failure(clock.now());
            return DeliveryOutcome::TransportFailed;
        }
        debug!("Report: sent {} ({:?})", body, admission);

        let acknowledged = match read_status_line(&mut conn, clock, ep.read_timeout_ms) {
            Some(line) => match parse_status_code(&line) {
                Some(code) if (200..300).contains(&code) => true,
                Some(code) => {
                    warn!("Report: hub answered {}", code);
                    false
                }
                None => {
                    warn!("Report: malformed hub reply {:?}", line);
                    false
                }
            },
            None => {
                info!("Report: no reply within {}ms, treating as delivered", ep.read_timeout_ms);
                false
            }
        };

        // Connectivity worked, whatever the hub said.
        self.policy.record_success();
        DeliveryOutcome::Sent { acknowledged }
        // `conn` dropped here; every early return above drops it too.
    }
}

/// Collect bytes until the first line is complete, the peer closes, or
/// `window_ms` passes on `clock`.  `None` if nothing at all arrived.
fn read_status_line(conn: &mut impl Connection, clock: &impl Clock, window_ms: u32) -> Option<String> {
    let start = clock.now();
    let mut buf = [0u8; REPLY_BUF_LEN];
    let mut filled = 0;

    while filled < buf.len() && elapsed_since(clock.now(), start) < window_ms {
        match conn.read(&mut buf[filled..]) {
            Ok(0) => {}
            Ok(n) => {
                filled += n;
                if buf[..filled].contains(&b'\n') {
                    break;
                }
            }
            Err(TransportError::Closed) => break,
            Err(e) => {
                debug!("Report: reply read error ({})", e);
                break;
            }
        }
    }

    if filled == 0 {
        return None;
    }
    let text = String::from_utf8_lossy(&buf[..filled]);
    let line = text.lines().next().unwrap_or_default().trim_end();
    Some(line.to_owned())
}
