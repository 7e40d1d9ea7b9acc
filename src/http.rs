//! HTTP routing: maps inbound requests to service commands.
//!
//! Transport-agnostic: the device server adapter hands in method, path and
//! raw query string, and writes back whatever [`HttpResponse`] comes out.
//! Host tests call [`Router::route`] directly.
//!
//! | Route               | Methods    | Reply                                  |
//! |---------------------|------------|----------------------------------------|
//! | `/`                 | GET        | greeting + relay states (JSON)         |
//! | `/control`          | GET, POST  | relays applied by the query (JSON)     |
//! | `/refresh`          | GET, POST  | `{"refresh":"<outcome>"}`              |
//! | `/description.xml`  | GET        | UPnP device description                |
//! | anything else       |            | 404 `text/plain`                       |

use embedded_hal::digital::OutputPin;
use log::{debug, error};
use serde::Serialize;

use crate::app::commands::{AppCommand, AppReply};
use crate::app::ports::{Connector, EventSink};
use crate::app::service::NodeService;
use crate::clock::Clock;
use crate::discovery::{DiscoveryInfo, description_xml};

pub const CONTENT_JSON: &str = "application/json";
pub const CONTENT_XML: &str = "text/xml";
pub const CONTENT_TEXT: &str = "text/plain";

/// Request method, reduced to what the routes distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

impl Method {
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Self::Get,
            "POST" => Self::Post,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn json(value: &impl Serialize) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status: 200,
                content_type: CONTENT_JSON,
                body,
            },
            Err(_) => Self::server_error(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: CONTENT_TEXT,
            body: "404: Not found".into(),
        }
    }

    fn server_error() -> Self {
        Self {
            status: 500,
            content_type: CONTENT_TEXT,
            body: "500: Internal error".into(),
        }
    }
}

#[derive(Serialize)]
struct RefreshBody {
    refresh: &'static str,
}

/// Route table plus the static data the routes render.
pub struct Router {
    discovery: DiscoveryInfo,
    serial: u32,
}

impl Router {
    pub fn new(discovery: DiscoveryInfo, serial: u32) -> Self {
        Self { discovery, serial }
    }

    pub fn route<P, T, C, const N: usize>(
        &self,
        service: &mut NodeService<P, T, C, N>,
        method: Method,
        path: &str,
        query: &str,
        sink: &mut impl EventSink,
    ) -> HttpResponse
    where
        P: OutputPin,
        T: Connector,
        C: Clock,
    {
        debug!("HTTP: {:?} {} ?{}", method, path, query);
        let command = match (method, path) {
            (Method::Get, "/") => AppCommand::QueryStatus,
            (Method::Get | Method::Post, "/control") => AppCommand::Control(parse_query(query)),
            (Method::Get | Method::Post, "/refresh") => AppCommand::Refresh,
            (Method::Get, "/description.xml") => {
                return HttpResponse {
                    status: 200,
                    content_type: CONTENT_XML,
                    body: description_xml(&self.discovery, self.serial, service.link().ip_or_unspecified()),
                };
            }
            _ => return HttpResponse::not_found(),
        };

        match service.handle_command(command, sink) {
            Ok(AppReply::Status(status)) => HttpResponse::json(&status),
            Ok(AppReply::Control(applied)) => HttpResponse::json(&applied),
            Ok(AppReply::Refreshed(outcome)) => HttpResponse::json(&RefreshBody {
                refresh: outcome.as_str(),
            }),
            Err(e) => {
                error!("HTTP: {} failed: {}", path, e);
                HttpResponse::server_error()
            }
        }
    }
}

/// Split a request target into path and raw query (`/a?b=c` → `/a`, `b=c`).
pub fn split_target(uri: &str) -> (&str, &str) {
    uri.split_once('?').unwrap_or((uri, ""))
}

/// Decode `k=v&k2=v2` into owned pairs.  Keys without `=` get an empty
/// value; empty segments are skipped.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|seg| !seg.is_empty())
        .map(|seg| {
            let (k, v) = seg.split_once('=').unwrap_or((seg, ""));
            (url_decode(k), url_decode(v))
        })
        .collect()
}

/// Form decoding: `+` is a space, `%XX` a byte.  Malformed escapes are
/// kept literally.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match (bytes.get(i + 1).and_then(hex_val), bytes.get(i + 2).and_then(hex_val)) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 2;
                }
                _ => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: &u8) -> Option<u8> {
    (*b as char).to_digit(16).map(|d| d as u8)
}
