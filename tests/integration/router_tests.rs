//! HTTP route table against a mock-backed service.

use embedded_hal::digital::PinState;
use relaynode::app::ports::LinkState;
use relaynode::app::relays::RelayState;
use relaynode::discovery::DiscoveryInfo;
use relaynode::http::{CONTENT_JSON, CONTENT_TEXT, CONTENT_XML, Method, Router};
use std::net::Ipv4Addr;

use crate::mock_hw::{HubReply, MockHub, Rig, rig};

const OK: &[u8] = b"HTTP/1.1 200 OK\r\n";

fn setup() -> (Rig, Router) {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(LinkState::up(Ipv4Addr::new(192, 168, 0, 77)));
    (r, Router::new(DiscoveryInfo::default(), 0x00EF_CAFE))
}

#[test]
fn root_returns_greeting_and_states() {
    let (mut r, router) = setup();
    let resp = router.route(&mut r.service, Method::Get, "/", "", &mut r.sink);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, CONTENT_JSON);
    assert_eq!(
        resp.body,
        r#"{"message":"NodeMCU","relaySwitch1":"off","relaySwitch2":"off"}"#
    );
    assert_eq!(r.hub.borrow().connects, 0);
}

#[test]
fn control_applies_query_and_echoes() {
    let (mut r, router) = setup();
    let resp = router.route(
        &mut r.service,
        Method::Get,
        "/control",
        "relay1=on&relay2=off",
        &mut r.sink,
    );

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, r#"{"relaySwitch1":"on","relaySwitch2":"off"}"#);
    assert_eq!(r.pins[0].last(), Some(PinState::Low));
    assert_eq!(r.service.relays().get(0), Ok(RelayState::On));
    assert_eq!(r.hub.borrow().connects, 1, "one report per control request");
}

#[test]
fn control_accepts_post_and_encoded_values() {
    let (mut r, router) = setup();
    let resp = router.route(&mut r.service, Method::Post, "/control", "relay%32=%6Fn", &mut r.sink);

    assert_eq!(resp.status, 200);
    assert_eq!(r.service.relays().get(1), Ok(RelayState::On));
}

#[test]
fn control_without_known_keys_is_empty() {
    let (mut r, router) = setup();
    let resp = router.route(&mut r.service, Method::Get, "/control", "lamp=on", &mut r.sink);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "{}");
    assert_eq!(r.hub.borrow().connects, 0);
}

#[test]
fn refresh_reports_outcome() {
    let (mut r, router) = setup();
    let resp = router.route(&mut r.service, Method::Post, "/refresh", "", &mut r.sink);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, r#"{"refresh":"acknowledged"}"#);
}

#[test]
fn description_xml_uses_link_ip_and_serial() {
    let (mut r, router) = setup();
    let resp = router.route(&mut r.service, Method::Get, "/description.xml", "", &mut r.sink);

    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, CONTENT_XML);
    assert!(resp.body.contains("<URLBase>http://192.168.0.77:80/</URLBase>"));
    assert!(resp.body.contains("<serialNumber>15715070</serialNumber>"));
}

#[test]
fn unknown_paths_and_methods_are_404() {
    let (mut r, router) = setup();
    for (method, path) in [
        (Method::Get, "/nope"),
        (Method::Post, "/"),
        (Method::Other, "/control"),
        (Method::Post, "/description.xml"),
    ] {
        let resp = router.route(&mut r.service, method, path, "", &mut r.sink);
        assert_eq!(resp.status, 404, "{method:?} {path}");
        assert_eq!(resp.content_type, CONTENT_TEXT);
        assert_eq!(resp.body, "404: Not found");
    }
    assert_eq!(r.hub.borrow().connects, 0);
}
