//! Mock adapters for integration tests.
//!
//! Records every pin write, hub exchange and emitted event so tests can
//! assert on the full history without touching GPIO or sockets.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::{Error, ErrorKind, ErrorType, OutputPin, PinState};
use relaynode::app::events::AppEvent;
use relaynode::app::ports::{Connection, Connector, EventSink, TransportError};
use relaynode::app::relays::{ActuatorBank, RELAY_NAMES};
use relaynode::app::service::NodeService;
use relaynode::clock::ManualClock;
use relaynode::config::NodeConfig;

// ── Pins ──────────────────────────────────────────────────────

/// Output pin that records every level written to it.  Writes fail
/// (and record nothing) while `broken` is set.
#[derive(Clone, Default)]
pub struct MockPin {
    pub levels: Rc<RefCell<Vec<PinState>>>,
    pub broken: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn last(&self) -> Option<PinState> {
        self.levels.borrow().last().copied()
    }

    pub fn write(&self, level: PinState) -> Result<(), MockPinError> {
        if self.broken.get() {
            return Err(MockPinError);
        }
        self.levels.borrow_mut().push(level);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockPinError;

impl Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockPinError> {
        self.write(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), MockPinError> {
        self.write(PinState::High)
    }
}

// ── Hub ───────────────────────────────────────────────────────

/// How the fake hub answers one connection.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum HubReply {
    /// Connection refused.
    Refuse,
    /// Accept and answer with these bytes.
    Answer(&'static [u8]),
    /// Accept and never answer.
    Silent,
}

/// Shared record of everything the hub saw.
#[derive(Default)]
pub struct HubLog {
    pub connects: usize,
    pub released: usize,
    pub requests: Vec<String>,
}

/// Scripted hub; falls back to `default` when the script runs out.
pub struct MockHub {
    script: VecDeque<HubReply>,
    default: HubReply,
    pub log: Rc<RefCell<HubLog>>,
}

#[allow(dead_code)]
impl MockHub {
    pub fn always(reply: HubReply) -> Self {
        Self {
            script: VecDeque::new(),
            default: reply,
            log: Rc::default(),
        }
    }

    pub fn scripted(script: Vec<HubReply>, default: HubReply) -> Self {
        Self {
            script: script.into(),
            default,
            log: Rc::default(),
        }
    }

    pub fn push(&mut self, reply: HubReply) {
        self.script.push_back(reply);
    }
}

pub struct MockConn {
    reply: HubReply,
    served: bool,
    log: Rc<RefCell<HubLog>>,
}

impl Connector for MockHub {
    type Conn = MockConn;

    fn connect(&mut self, _host: &str, _port: u16, _timeout_ms: u32) -> Result<MockConn, TransportError> {
        self.log.borrow_mut().connects += 1;
        let reply = self.script.pop_front().unwrap_or(self.default);
        match reply {
            HubReply::Refuse => Err(TransportError::Unreachable),
            reply => Ok(MockConn {
                reply,
                served: false,
                log: Rc::clone(&self.log),
            }),
        }
    }
}

impl Connection for MockConn {
    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.log
            .borrow_mut()
            .requests
            .push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.reply {
            HubReply::Answer(bytes) if !self.served => {
                self.served = true;
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            HubReply::Answer(_) => Err(TransportError::Closed),
            _ => Ok(0),
        }
    }
}

impl Drop for MockConn {
    fn drop(&mut self) {
        self.log.borrow_mut().released += 1;
    }
}

// ── Events ────────────────────────────────────────────────────

/// Event sink that keeps everything it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Assembly ──────────────────────────────────────────────────

pub type TestService = NodeService<MockPin, MockHub, ManualClock, 2>;

/// A service over mock pins and `hub`, plus handles to observe them.
pub struct Rig {
    pub service: TestService,
    pub pins: [MockPin; 2],
    pub clock: ManualClock,
    pub hub: Rc<RefCell<HubLog>>,
    pub sink: RecordingSink,
}

pub fn rig(hub: MockHub) -> Rig {
    let pins = [MockPin::default(), MockPin::default()];
    let relays = ActuatorBank::new(pins.clone(), RELAY_NAMES).expect("mock pins never fail");
    // Every clock read moves time forward so reply windows expire.
    let clock = ManualClock::new(0).with_step(1);
    let log = Rc::clone(&hub.log);
    let service = NodeService::new(relays, hub, clock.clone(), &NodeConfig::default());
    Rig {
        service,
        pins,
        clock,
        hub: log,
        sink: RecordingSink::default(),
    }
}
