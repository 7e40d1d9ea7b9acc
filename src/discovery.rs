//! Discovery metadata and the device description document.
//!
//! The description is what hubs fetch from `/description.xml` after they
//! found the node on the LAN.  Everything except the serial number and the
//! IP address is static.

use core::fmt::Write as _;
use std::net::Ipv4Addr;

use crate::config::PROJECT_NAME;

/// Static identity advertised to hubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryInfo {
    pub friendly_name: &'static str,
    pub model_name: &'static str,
    pub model_number: &'static str,
    pub model_url: &'static str,
    pub manufacturer: &'static str,
    pub manufacturer_url: &'static str,
    /// Relative to the URL base.
    pub presentation_url: &'static str,
    pub http_port: u16,
}

impl Default for DiscoveryInfo {
    fn default() -> Self {
        Self {
            friendly_name: PROJECT_NAME,
            model_name: PROJECT_NAME,
            model_number: "node-mcu-001",
            model_url: "https://www.eztechpc.com",
            manufacturer: "EztechPC ESP8266 Device",
            manufacturer_url: "https://www.eztechpc.com",
            presentation_url: "index.html",
            http_port: 80,
        }
    }
}

/// Fixed UUID prefix; the last six hex digits come from the serial.
const UUID_PREFIX: &str = "38323636-4558-4dda-9188-cda0e6";

/// Render the UPnP device description.
pub fn description_xml(info: &DiscoveryInfo, serial: u32, ip: Ipv4Addr) -> String {
    let mut xml = String::with_capacity(1024);
    let _ = write!(
        xml,
        "<?xml version=\"1.0\"?>\r\n\
         <root xmlns=\"urn:schemas-upnp-org:device-1-0\">\
         <specVersion><major>1</major><minor>0</minor></specVersion>\
         <URLBase>http://{ip}:{port}/</URLBase>\
         <device>\
         <deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>\
         <friendlyName>{friendly}</friendlyName>\
         <presentationURL>{presentation}</presentationURL>\
         <serialNumber>{serial}</serialNumber>\
         <modelName>{model}</modelName>\
         <modelNumber>{number}</modelNumber>\
         <modelURL>{model_url}</modelURL>\
         <manufacturer>{manufacturer}</manufacturer>\
         <manufacturerURL>{manufacturer_url}</manufacturerURL>\
         <UDN>uuid:{UUID_PREFIX}{uuid_tail:06x}</UDN>\
         </device>\
         </root>\r\n",
        port = info.http_port,
        friendly = Escaped(info.friendly_name),
        presentation = Escaped(info.presentation_url),
        model = Escaped(info.model_name),
        number = Escaped(info.model_number),
        model_url = Escaped(info.model_url),
        manufacturer = Escaped(info.manufacturer),
        manufacturer_url = Escaped(info.manufacturer_url),
        uuid_tail = serial & 0x00FF_FFFF,
    );
    xml
}

/// XML text escaping on the fly.
struct Escaped<'a>(&'a str);

impl core::fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&apos;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}
