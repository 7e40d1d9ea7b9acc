//! Integration tests for the NodeService → relays → hub pipeline.
//!
//! These run on the host (x86_64) and verify that commands arriving at
//! the service switch the right pins and produce exactly the reports the
//! hub is supposed to see.

use embedded_hal::digital::PinState;
use relaynode::app::commands::{AppCommand, AppReply};
use relaynode::app::events::{AppEvent, ReportTrigger};
use relaynode::app::ports::LinkState;
use relaynode::app::relays::RelayState;
use relaynode::app::reporter::DeliveryOutcome;
use relaynode::error::{ActuatorError, Error};
use std::net::Ipv4Addr;

use crate::mock_hw::{HubReply, MockHub, rig};

const OK: &[u8] = b"HTTP/1.1 200 OK\r\n\r\n";

fn online() -> LinkState {
    LinkState::up(Ipv4Addr::new(192, 168, 1, 50))
}

#[test]
fn boot_parks_every_relay_off() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.start(&mut r.sink);

    for pin in &r.pins {
        assert_eq!(*pin.levels.borrow(), vec![PinState::High]);
    }
    assert_eq!(r.sink.events, vec![AppEvent::Started { relays: 2 }]);
    assert_eq!(r.hub.borrow().connects, 0, "boot does not report");
}

#[test]
fn control_on_switches_relay_and_reports_once() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());

    let reply = r.service.handle_control(&[("relay1", "on")], &mut r.sink).unwrap();

    assert_eq!(r.service.relays().get(0), Ok(RelayState::On));
    assert_eq!(r.pins[0].last(), Some(PinState::Low));
    assert_eq!(reply.applied, vec![("relaySwitch1", RelayState::On)]);
    assert_eq!(reply.report, Some(DeliveryOutcome::Sent { acknowledged: true }));

    let hub = r.hub.borrow();
    assert_eq!(hub.connects, 1);
    assert_eq!(hub.released, 1);
    assert!(hub.requests[0].contains(r#""relaySwitch1":"on""#));
    assert!(hub.requests[0].contains(r#""relaySwitch2":"off""#));
    assert!(hub.requests[0].contains(r#""ip":"192.168.1.50""#));
}

#[test]
fn control_with_two_keys_still_reports_once() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());

    r.service
        .handle_control(&[("relay1", "on"), ("relay2", "on")], &mut r.sink)
        .unwrap();

    let hub = r.hub.borrow();
    assert_eq!(hub.connects, 1);
    let req = &hub.requests[0];
    assert!(req.contains(r#""relaySwitch1":"on""#) && req.contains(r#""relaySwitch2":"on""#));
}

#[test]
fn unknown_keys_are_ignored_without_reporting() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());

    let reply = r.service.handle_control(&[("relay9", "on"), ("x", "y")], &mut r.sink).unwrap();

    assert!(reply.applied.is_empty());
    assert_eq!(reply.report, None);
    assert_eq!(r.hub.borrow().connects, 0);
    assert_eq!(r.pins[0].levels.borrow().len(), 1);
}

#[test]
fn any_value_but_on_means_off() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());
    r.service.handle_control(&[("relay2", "on")], &mut r.sink).unwrap();

    r.service.handle_control(&[("relay2", "ON")], &mut r.sink).unwrap();
    assert_eq!(r.service.relays().get(1), Ok(RelayState::Off));
    assert_eq!(r.pins[1].last(), Some(PinState::High));
}

#[test]
fn repeated_command_neither_reports_nor_emits_change() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());
    r.service.handle_control(&[("relay1", "on")], &mut r.sink).unwrap();
    r.sink.events.clear();

    let reply = r.service.handle_control(&[("relay1", "on")], &mut r.sink).unwrap();

    assert_eq!(r.hub.borrow().connects, 1, "no second push without a change");
    assert_eq!(reply.applied, vec![("relaySwitch1", RelayState::On)]);
    assert_eq!(reply.report, None);
    assert!(r.sink.events.is_empty());
}

#[test]
fn switching_an_off_relay_off_does_not_report() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());

    let reply = r.service.handle_control(&[("relay1", "off")], &mut r.sink).unwrap();

    assert_eq!(reply.report, None);
    assert_eq!(r.hub.borrow().connects, 0);
    assert_eq!(r.pins[0].levels.borrow().len(), 1, "only the boot write");
}

#[test]
fn repeated_key_keeps_last_value() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());

    let reply = r
        .service
        .handle_control(&[("relay1", "on"), ("relay1", "off")], &mut r.sink)
        .unwrap();

    assert_eq!(reply.applied, vec![("relaySwitch1", RelayState::Off)]);
    assert_eq!(r.service.relays().get(0), Ok(RelayState::Off));
    assert_eq!(r.hub.borrow().connects, 1);
}

#[test]
fn pin_failure_still_reports_relays_already_switched() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());
    r.pins[1].broken.set(true);

    let result = r
        .service
        .handle_control(&[("relay1", "on"), ("relay2", "on")], &mut r.sink);

    assert_eq!(result, Err(Error::Actuator(ActuatorError::GpioWriteFailed)));
    assert_eq!(r.service.relays().get(0), Ok(RelayState::On));
    assert_eq!(r.service.relays().get(1), Ok(RelayState::Off));

    let hub = r.hub.borrow();
    assert_eq!(hub.connects, 1, "the switched relay is still pushed once");
    assert!(hub.requests[0].contains(r#""relaySwitch1":"on""#));
    assert!(hub.requests[0].contains(r#""relaySwitch2":"off""#));
}

#[test]
fn pin_failure_on_first_key_does_not_report() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());
    r.pins[0].broken.set(true);

    let result = r
        .service
        .handle_control(&[("relay1", "on"), ("relay2", "on")], &mut r.sink);

    assert!(result.is_err());
    assert_eq!(r.service.relays().get(1), Ok(RelayState::Off), "later keys are not applied");
    assert_eq!(r.hub.borrow().connects, 0);
}

#[test]
fn control_succeeds_while_hub_is_down() {
    let mut r = rig(MockHub::always(HubReply::Refuse));
    r.service.set_link(online());

    let reply = r.service.handle_control(&[("relay1", "on")], &mut r.sink).unwrap();

    assert_eq!(r.service.relays().get(0), Ok(RelayState::On));
    assert_eq!(reply.report, Some(DeliveryOutcome::TransportFailed));
}

#[test]
fn status_query_never_touches_the_network() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());
    r.service.relays_mut().set(1, RelayState::On).unwrap();

    let status = r.service.handle_status_query();

    assert_eq!(status.message.as_str(), "NodeMCU");
    assert_eq!(
        status.relays,
        vec![("relaySwitch1", RelayState::Off), ("relaySwitch2", RelayState::On)]
    );
    assert_eq!(r.hub.borrow().connects, 0);
}

#[test]
fn refresh_forces_a_report() {
    let mut r = rig(MockHub::always(HubReply::Silent));
    r.service.set_link(online());

    let reply = r.service.handle_command(AppCommand::Refresh, &mut r.sink).unwrap();

    assert_eq!(reply, AppReply::Refreshed(DeliveryOutcome::Sent { acknowledged: false }));
    assert_eq!(
        r.sink.events.last(),
        Some(&AppEvent::Report {
            trigger: ReportTrigger::Refresh,
            outcome: DeliveryOutcome::Sent { acknowledged: false },
            consecutive_failures: 0,
        })
    );
}

#[test]
fn command_dispatch_decodes_owned_pairs() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());

    let reply = r
        .service
        .handle_command(
            AppCommand::Control(vec![("relay2".into(), "on".into())]),
            &mut r.sink,
        )
        .unwrap();

    match reply {
        AppReply::Control(c) => assert_eq!(c.applied, vec![("relaySwitch2", RelayState::On)]),
        other => panic!("unexpected reply {other:?}"),
    }
}

#[test]
fn report_while_offline_fails_without_connecting() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));

    let outcome = r.service.report(ReportTrigger::Scheduled, &mut r.sink);

    assert_eq!(outcome, DeliveryOutcome::TransportFailed);
    assert_eq!(r.hub.borrow().connects, 0);
    assert_eq!(r.service.reporter().policy().consecutive_failures(), 1);
}

#[test]
fn uptime_in_payload_follows_the_clock() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(online());
    r.clock.advance(86_400_000 + 3_661_000);

    r.service.report(ReportTrigger::Scheduled, &mut r.sink);

    assert!(r.hub.borrow().requests[0].contains(r#""uptime":"1 days and 1:1:1""#));
}
