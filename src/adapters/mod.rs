//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements            | Connects to              |
//! |----------------|-----------------------|--------------------------|
//! | `device_id`    |                       | eFuse factory MAC        |
//! | `http_server`  | (drives `Router`)     | ESP-IDF HTTP server      |
//! | `log_sink`     | EventSink             | Serial log output        |
//! | `mdns`         |                       | ESP-IDF mDNS responder   |
//! | `tcp_client`   | Connector, Connection | Hub over TCP             |
//! | `time`         | Clock                 | ESP32 system timer       |
//! | `wifi`         | ConnectivityPort      | ESP-IDF WiFi STA         |

pub mod device_id;
#[cfg(target_os = "espidf")]
pub mod http_server;
pub mod log_sink;
pub mod mdns;
pub mod tcp_client;
pub mod time;
pub mod wifi;
