//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (outbound TCP, event sinks, the scheduler's consumer)
//! implement these traits.  The [`NodeService`](super::service::NodeService)
//! consumes them via generics, so the domain core never touches sockets
//! directly.  Relay pins come in through `embedded_hal::digital::OutputPin`
//! and time through [`Clock`](crate::clock::Clock).

use core::fmt;
use std::net::Ipv4Addr;

// ───────────────────────────────────────────────────────────────
// Outbound transport (domain → hub)
// ───────────────────────────────────────────────────────────────

/// Opens outbound byte streams to the hub.
pub trait Connector {
    type Conn: Connection;

    /// Connect to `host:port`, giving up after `timeout_ms`.
    fn connect(&mut self, host: &str, port: u16, timeout_ms: u32) -> Result<Self::Conn, TransportError>;
}

/// One open outbound stream.  Dropping it releases the socket.
pub trait Connection {
    /// Write all of `data` or fail.
    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read up to `buf.len()` bytes.  Returns `Ok(0)` when nothing has
    /// arrived yet; a closed peer is [`TransportError::Closed`].
    /// Implementations must return promptly (bounded, short wait).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

/// Errors from [`Connector`] / [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Host could not be resolved or refused the connection.
    Unreachable,
    /// Connect did not complete in time.
    Timeout,
    /// Socket-level I/O failure.
    Io,
    /// Peer closed the stream.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "host unreachable"),
            Self::Timeout => write!(f, "connect timed out"),
            Self::Io => write!(f, "socket I/O error"),
            Self::Closed => write!(f, "connection closed by peer"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Network identity (connectivity adapter → domain)
// ───────────────────────────────────────────────────────────────

/// Snapshot of the station link, copied into the service by the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkState {
    pub connected: bool,
    pub ip: Option<Ipv4Addr>,
}

impl LinkState {
    pub const fn up(ip: Ipv4Addr) -> Self {
        Self {
            connected: true,
            ip: Some(ip),
        }
    }

    pub const fn down() -> Self {
        Self {
            connected: false,
            ip: None,
        }
    }

    /// Address as reported to the hub; `0.0.0.0` while unassigned.
    pub fn ip_or_unspecified(&self) -> Ipv4Addr {
        self.ip.unwrap_or(Ipv4Addr::UNSPECIFIED)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback the [`Scheduler`](crate::scheduler::Scheduler) invokes when a
/// periodic task is due.  The scheduler knows nothing about what the task
/// does; the main loop routes it to the service.
pub trait SchedulerDelegate {
    /// `label` is the label the task was registered with.
    fn on_schedule_fired(&mut self, label: &str);
}
