//! Outbound TCP adapter.
//!
//! Implements [`Connector`] / [`Connection`] over `std::net::TcpStream`,
//! which maps onto lwIP sockets under ESP-IDF and onto the host stack in
//! simulation, so one implementation serves both.
//!
//! ## Connection model
//!
//! 1. `connect()` resolves `host:port` and tries each address with the
//!    caller's timeout.
//! 2. Reads wait at most [`READ_POLL_MS`] and return `Ok(0)` when nothing
//!    arrived, so the reporter's deadline loop stays in charge of timing.
//! 3. Dropping the connection closes the socket.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::app::ports::{Connection, Connector, TransportError};

/// Longest single blocking read.
pub const READ_POLL_MS: u64 = 10;

#[derive(Debug, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

pub struct TcpConnection {
    stream: TcpStream,
}

fn map_io(e: &std::io::Error) -> TransportError {
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout,
        ErrorKind::ConnectionRefused | ErrorKind::NotFound | ErrorKind::AddrNotAvailable => {
            TransportError::Unreachable
        }
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
            TransportError::Closed
        }
        _ => TransportError::Io,
    }
}

impl Connector for TcpConnector {
    type Conn = TcpConnection;

    fn connect(&mut self, host: &str, port: u16, timeout_ms: u32) -> Result<TcpConnection, TransportError> {
        let timeout = Duration::from_millis(u64::from(timeout_ms.max(1)));
        let addrs = (host, port).to_socket_addrs().map_err(|e| {
            debug!("TCP: resolve {}:{} failed ({})", host, port, e);
            TransportError::Unreachable
        })?;

        let mut last = TransportError::Unreachable;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    let poll = Some(Duration::from_millis(READ_POLL_MS));
                    stream.set_read_timeout(poll).map_err(|e| map_io(&e))?;
                    stream.set_write_timeout(Some(timeout)).map_err(|e| map_io(&e))?;
                    stream.set_nodelay(true).map_err(|e| map_io(&e))?;
                    return Ok(TcpConnection { stream });
                }
                Err(e) => {
                    debug!("TCP: connect {} failed ({})", addr, e);
                    last = map_io(&e);
                }
            }
        }
        Err(last)
    }
}

impl Connection for TcpConnection {
    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(data).map_err(|e| map_io(&e))?;
        self.stream.flush().map_err(|e| map_io(&e))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.stream.read(buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(ref e) if e.kind() == ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(map_io(&e)),
        }
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
