//! RelayNode Firmware: Main Entry Point
//!
//! Hexagonal architecture: the service owns the relays and the hub
//! reporter, adapters feed it commands and time.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  RelayPin         LogEventSink   SystemClock   TcpConnector    │
//! │  (OutputPin)      (EventSink)    (Clock)       (Connector)     │
//! │  WifiAdapter      MdnsAdapter    EspHttpServer ─▶ Router       │
//! │  (Connectivity)   (discovery)    (HTTP task)                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        Arc<Mutex<NodeService>> (pure logic)            │    │
//! │  │  ActuatorBank · StatusReporter · FailurePolicy         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven, main task)                        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use relaynode::adapters::device_id;
use relaynode::adapters::http_server::{self, SharedService};
use relaynode::adapters::log_sink::LogEventSink;
use relaynode::adapters::mdns::MdnsAdapter;
use relaynode::adapters::tcp_client::TcpConnector;
use relaynode::adapters::time::SystemClock;
use relaynode::adapters::wifi::{ConnectivityPort, WifiAdapter};
use relaynode::app::events::ReportTrigger;
use relaynode::app::ports::SchedulerDelegate;
use relaynode::app::relays::{ActuatorBank, RELAY_NAMES};
use relaynode::app::service::NodeService;
use relaynode::clock::Clock;
use relaynode::config::NodeConfig;
use relaynode::discovery::DiscoveryInfo;
use relaynode::drivers::hw_init;
use relaynode::drivers::relay_pin::RelayPin;
use relaynode::http::Router;
use relaynode::scheduler::Scheduler;

/// Main-loop period.  Bounds scheduler jitter and WiFi poll latency.
const LOOP_PERIOD_MS: u64 = 50;

const STATUS_TASK: &str = "status";

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the service) to the
// shared NodeService: a due "status" task becomes one report attempt.

struct ServiceDelegate<'a> {
    service: &'a SharedService,
    sink: LogEventSink,
}

impl SchedulerDelegate for ServiceDelegate<'_> {
    fn on_schedule_fired(&mut self, label: &str) {
        if label != STATUS_TASK {
            warn!("Schedule fired for unknown task '{}'", label);
            return;
        }
        match self.service.lock() {
            Ok(mut svc) => {
                svc.report(ReportTrigger::Scheduled, &mut self.sink);
            }
            Err(_) => error!("Scheduler: service lock poisoned, report skipped"),
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RelayNode v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = NodeConfig::default();
    config.validate()?;
    info!(
        "Config: hub={}:{} every {}ms",
        config.hub_host, config.hub_port, config.status_interval_ms
    );

    // ── 3. Relays: parked off before anything else runs ───────
    hw_init::init_peripherals().map_err(|e| anyhow!("HAL init failed: {}", e))?;
    let relays = ActuatorBank::new(RelayPin::board(), RELAY_NAMES)?;

    // ── 4. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let serial = device_id::serial_number(&mac);
    let hostname = device_id::hostname(&mac);
    info!("Device serial: {} (hostname: {})", serial, hostname);

    // ── 5. WiFi station ───────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs)?;

    let clock = SystemClock::new();
    wifi.set_credentials(config.wifi_ssid.as_str(), config.wifi_password.as_str())
        .map_err(|e| anyhow!("WiFi: {}", e))?;
    if let Err(e) = wifi.connect(clock.now()) {
        // Not fatal: the reconnect backoff keeps trying from the loop.
        warn!("WiFi: initial connect failed ({}), will retry", e);
    }

    // ── 6. Service ────────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut service = NodeService::new(relays, TcpConnector::new(), SystemClock::new(), &config);
    service.set_link(wifi.link());
    service.start(&mut sink);
    let service: SharedService = Arc::new(Mutex::new(service));

    // ── 7. HTTP server + discovery ────────────────────────────
    let discovery = DiscoveryInfo {
        http_port: config.http_port,
        ..DiscoveryInfo::default()
    };
    let router = Arc::new(Router::new(discovery.clone(), serial));
    let _server = http_server::start(config.http_port, Arc::clone(&service), router)?;

    let mut mdns = MdnsAdapter::new(hostname, discovery.model_name, serial, config.http_port);
    mdns.follow_link(wifi.is_connected());

    // ── 8. Scheduler ──────────────────────────────────────────
    let mut sched = Scheduler::new();
    sched
        .add(STATUS_TASK, config.status_interval_ms, clock.now())
        .ok_or_else(|| anyhow!("scheduler full"))?;
    let mut delegate = ServiceDelegate {
        service: &service,
        sink: LogEventSink::new(),
    };

    info!("System ready. Entering main loop.");

    // ── 9. Main loop ──────────────────────────────────────────
    loop {
        let now = clock.now();

        wifi.poll(now);
        let link = wifi.link();
        match service.lock() {
            Ok(mut svc) => svc.set_link(link),
            Err(_) => return Err(anyhow!("service lock poisoned")),
        }
        mdns.follow_link(link.connected);

        sched.tick(now, &mut delegate);

        std::thread::sleep(Duration::from_millis(LOOP_PERIOD_MS));
    }
}
