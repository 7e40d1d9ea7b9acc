//! HTTP control server adapter (ESP-IDF only).
//!
//! Registers one wildcard handler per method on `EspHttpServer` and hands
//! every request to the [`Router`], so routing and 404 handling stay in
//! host-testable code.  Handlers run on the server's own task and lock the
//! shared service for the duration of one command.

use std::sync::{Arc, Mutex};

use esp_idf_svc::http::Method as EspMethod;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::io::Write;
use log::info;

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::tcp_client::TcpConnector;
use crate::adapters::time::SystemClock;
use crate::app::service::NodeService;
use crate::drivers::relay_pin::RelayPin;
use crate::error::{CommsError, Error};
use crate::http::{Method, Router, split_target};

/// The concrete service shared between the main loop and the handlers.
pub type DeviceService = NodeService<RelayPin, TcpConnector, SystemClock, 2>;
pub type SharedService = Arc<Mutex<DeviceService>>;

pub fn start(port: u16, service: SharedService, router: Arc<Router>) -> Result<EspHttpServer<'static>, Error> {
    let conf = Configuration {
        http_port: port,
        uri_match_wildcard: true,
        stack_size: 8 * 1024,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&conf).map_err(|_| CommsError::HttpServerFailed)?;

    for (esp_method, method) in [(EspMethod::Get, Method::Get), (EspMethod::Post, Method::Post)] {
        let service = Arc::clone(&service);
        let router = Arc::clone(&router);
        server
            .fn_handler::<anyhow::Error, _>("/*", esp_method, move |req| {
                let uri = req.uri().to_owned();
                let (path, query) = split_target(&uri);
                let response = {
                    let mut svc = service
                        .lock()
                        .map_err(|_| anyhow::anyhow!("service lock poisoned"))?;
                    router.route(&mut svc, method, path, query, &mut LogEventSink::new())
                };
                req.into_response(response.status, None, &[("Content-Type", response.content_type)])?
                    .write_all(response.body.as_bytes())?;
                Ok(())
            })
            .map_err(|_| CommsError::HttpServerFailed)?;
    }

    info!("HTTP server started on port {}", port);
    Ok(server)
}
