//! System configuration parameters
//!
//! All tunable parameters for the relay node.  Nothing is persisted: every
//! boot starts from [`NodeConfig::default`], with the hub address and WiFi
//! credentials optionally baked in at build time through environment
//! variables (`RELAYNODE_HUB_HOST`, `RELAYNODE_HUB_PORT`,
//! `RELAYNODE_WIFI_SSID`, `RELAYNODE_WIFI_PASS`).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default hub (home-automation controller) address.
pub const DEFAULT_HUB_HOST: &str = "192.168.10.20";
pub const DEFAULT_HUB_PORT: u16 = 39500;

/// Name sent in the `Server` header and used as the discovery friendly name.
pub const PROJECT_NAME: &str = "NodeMCU - Custom Device";

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Hub endpoint ---
    /// Hostname or IPv4 address of the hub receiving status pushes
    pub hub_host: heapless::String<64>,
    /// TCP port of the hub
    pub hub_port: u16,

    // --- Reporting ---
    /// Periodic status push interval (milliseconds)
    pub status_interval_ms: u32,
    /// Outbound connect timeout (milliseconds)
    pub connect_timeout_ms: u32,
    /// Window for the hub's reply after the request is sent (milliseconds)
    pub read_timeout_ms: u32,

    // --- Failure policy ---
    /// Consecutive failures before pushes are suppressed
    pub failure_threshold: u8,
    /// How long pushes stay suppressed before a probe (milliseconds)
    pub failure_cooldown_ms: u32,

    // --- HTTP ---
    /// Port of the control/status HTTP server
    pub http_port: u16,
    /// Fixed greeting returned by the status route
    pub greeting: heapless::String<32>,

    // --- WiFi ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Hub
            hub_host: bounded(option_env!("RELAYNODE_HUB_HOST").unwrap_or(DEFAULT_HUB_HOST)),
            hub_port: option_env!("RELAYNODE_HUB_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_HUB_PORT),

            // Reporting
            status_interval_ms: 60_000, // 1/min
            connect_timeout_ms: 200,
            read_timeout_ms: 200,

            // Failure policy
            failure_threshold: 3,
            failure_cooldown_ms: 30 * 60 * 1000, // 30 min

            // HTTP
            http_port: 80,
            greeting: bounded("NodeMCU"),

            // WiFi
            wifi_ssid: bounded(option_env!("RELAYNODE_WIFI_SSID").unwrap_or("")),
            wifi_password: bounded(option_env!("RELAYNODE_WIFI_PASS").unwrap_or("")),
        }
    }
}

impl NodeConfig {
    /// Reject values that would break the reporting loop.
    pub fn validate(&self) -> Result<()> {
        if self.hub_host.is_empty() {
            return Err(Error::Config("hub_host is empty"));
        }
        if self.hub_port == 0 {
            return Err(Error::Config("hub_port is zero"));
        }
        if self.status_interval_ms == 0 {
            return Err(Error::Config("status_interval_ms is zero"));
        }
        if self.failure_threshold == 0 {
            return Err(Error::Config("failure_threshold is zero"));
        }
        // A single attempt must finish well inside one reporting period.
        if self.connect_timeout_ms.saturating_add(self.read_timeout_ms) >= self.status_interval_ms {
            return Err(Error::Config("timeouts exceed status interval"));
        }
        // Cooldown is measured on the wrapping tick; keep it unambiguous.
        if self.failure_cooldown_ms >= u32::MAX / 2 {
            return Err(Error::Config("failure_cooldown_ms too large"));
        }
        Ok(())
    }
}

/// Copy `s` into a fixed-capacity string, truncating at the capacity.
fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
