//! Device identity derived from the factory MAC address.
//!
//! Both values are deterministic across reboots (eFuse MAC):
//! - `serial_number`: the last 3 MAC bytes as one integer, reported in
//!   the device description and the mDNS TXT record
//! - `hostname`: `relaynode-xxyyzz`, used as the mDNS hostname

use core::fmt::Write as _;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Chip-id style serial: `0x00XXYYZZ` from the last 3 MAC bytes.
pub fn serial_number(mac: &MacAddress) -> u32 {
    u32::from_be_bytes([0, mac[3], mac[4], mac[5]])
}

/// Format: `relaynode-xxyyzz` (lowercase).
pub fn hostname(mac: &MacAddress) -> heapless::String<24> {
    let mut name = heapless::String::<24>::new();
    let _ = write!(name, "relaynode-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
