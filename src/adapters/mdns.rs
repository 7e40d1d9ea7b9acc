//! mDNS service advertisement adapter.
//!
//! Advertises `_http._tcp` on the control server port with TXT records
//! for the model name and serial number, so hubs can find the node
//! without a fixed IP.  Uses `esp-idf-svc` mDNS on ESP-IDF and is a no-op
//! on simulation targets.
//!
//! Lifecycle is tied to WiFi: start once an IP is assigned, stop when the
//! link goes away.

use core::fmt::Write as _;

use log::info;

const MDNS_SERVICE_TYPE: &str = "_http";
const MDNS_SERVICE_PROTO: &str = "_tcp";

/// mDNS advertisement adapter.
pub struct MdnsAdapter {
    hostname: heapless::String<24>,
    model: &'static str,
    serial: heapless::String<12>,
    port: u16,
    #[cfg(target_os = "espidf")]
    mdns: Option<esp_idf_svc::mdns::EspMdns>,
    active: bool,
}

impl MdnsAdapter {
    pub fn new(hostname: heapless::String<24>, model: &'static str, serial: u32, port: u16) -> Self {
        let mut serial_text = heapless::String::new();
        let _ = write!(serial_text, "{}", serial);
        Self {
            hostname,
            model,
            serial: serial_text,
            port,
            #[cfg(target_os = "espidf")]
            mdns: None,
            active: false,
        }
    }

    /// Whether mDNS is currently advertising.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// TXT records published with the service.
    pub fn txt_records(&self) -> [(&str, &str); 2] {
        [("model", self.model), ("serial", self.serial.as_str())]
    }

    /// Start hostname + service advertisement.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        if self.platform_start() {
            self.active = true;
            info!(
                "mDNS: advertising {}.local → {}.{}:{} (serial={})",
                self.hostname, MDNS_SERVICE_TYPE, MDNS_SERVICE_PROTO, self.port, self.serial
            );
        }
    }

    /// Stop advertisement.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.platform_stop();
        self.active = false;
        info!("mDNS: stopped");
    }

    /// Follow the link: advertise while connected.
    pub fn follow_link(&mut self, connected: bool) {
        if connected {
            self.start();
        } else {
            self.stop();
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> bool {
        use esp_idf_svc::mdns::EspMdns;

        let result = (|| {
            let mut mdns = EspMdns::take()?;
            mdns.set_hostname(self.hostname.as_str())?;
            mdns.set_instance_name(self.model)?;
            mdns.add_service(
                Some(self.model),
                MDNS_SERVICE_TYPE,
                MDNS_SERVICE_PROTO,
                self.port,
                &self.txt_records(),
            )?;
            Ok::<_, esp_idf_svc::sys::EspError>(mdns)
        })();

        match result {
            Ok(mdns) => {
                self.mdns = Some(mdns);
                true
            }
            Err(e) => {
                log::error!("mDNS: start failed ({})", e);
                false
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> bool {
        info!(
            "mDNS(sim): registered {}.local {}.{}:{} {:?}",
            self.hostname,
            MDNS_SERVICE_TYPE,
            MDNS_SERVICE_PROTO,
            self.port,
            self.txt_records()
        );
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) {
        // Dropping the handle frees the responder.
        self.mdns = None;
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) {
        info!("mDNS(sim): unregistered");
    }
}
