//! Status payload pushed to the hub, and the HTTP request that frames it.

use core::fmt::Write as _;
use std::net::Ipv4Addr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::relays::RelayState;
use crate::uptime::UptimeString;

/// One status report.  Built fresh for every attempt, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPayload<const N: usize> {
    pub relays: [(&'static str, RelayState); N],
    pub uptime: UptimeString,
    pub ip: Ipv4Addr,
}

/// Flat JSON object: one field per relay (keyed by report name), then
/// `uptime` and `ip`.
impl<const N: usize> Serialize for StatusPayload<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(N + 2))?;
        for (name, state) in &self.relays {
            map.serialize_entry(name, state)?;
        }
        map.serialize_entry("uptime", self.uptime.as_str())?;
        let mut ip = heapless::String::<16>::new();
        let _ = write!(ip, "{}", self.ip);
        map.serialize_entry("ip", ip.as_str())?;
        map.end()
    }
}

impl<const N: usize> StatusPayload<N> {
    pub fn to_json(&self) -> String {
        // Only strings and unit enums inside; serialisation cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Frame `body` as a single `POST /` to `host:port`.
pub fn frame_post(host: &str, port: u16, server_name: &str, body: &str) -> String {
    let mut req = String::with_capacity(body.len() + 192);
    let _ = write!(
        req,
        "POST / HTTP/1.1\r\n\
         Host: {host}:{port}\r\n\
         Content-Type: application/json;charset=utf-8\r\n\
         Content-Length: {len}\r\n\
         Server: {server_name}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        len = body.len(),
    );
    req
}

/// Status code from an HTTP status line (`HTTP/1.1 200 OK`).
pub fn parse_status_code(line: &str) -> Option<u16> {
    let mut parts = line.split_ascii_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}
