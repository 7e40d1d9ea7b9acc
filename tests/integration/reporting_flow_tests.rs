//! End-to-end reporting flow: scheduler → service → failure policy → hub.
//!
//! Mirrors the main loop: each test ticks the scheduler with the mock
//! clock and routes fired tasks into `NodeService::report`.

use relaynode::app::events::{AppEvent, ReportTrigger};
use relaynode::app::ports::{LinkState, SchedulerDelegate};
use relaynode::app::reporter::DeliveryOutcome;
use relaynode::clock::Clock;
use relaynode::scheduler::Scheduler;
use std::net::Ipv4Addr;

use crate::mock_hw::{HubReply, MockHub, RecordingSink, Rig, TestService, rig};

const INTERVAL: u32 = 60_000;
const COOLDOWN: u32 = 30 * 60 * 1000;
const OK: &[u8] = b"HTTP/1.1 200 OK\r\n";

/// Same role as the device's scheduler delegate.
struct ReportDelegate<'a> {
    service: &'a mut TestService,
    sink: &'a mut RecordingSink,
    outcomes: Vec<DeliveryOutcome>,
}

impl SchedulerDelegate for ReportDelegate<'_> {
    fn on_schedule_fired(&mut self, _label: &str) {
        let outcome = self.service.report(ReportTrigger::Scheduled, &mut *self.sink);
        self.outcomes.push(outcome);
    }
}

/// Advance the clock by `ms` and tick the scheduler once.
fn step(r: &mut Rig, sched: &mut Scheduler, ms: u32) -> Vec<DeliveryOutcome> {
    r.clock.advance(ms);
    let now = r.clock.get();
    let mut delegate = ReportDelegate {
        service: &mut r.service,
        sink: &mut r.sink,
        outcomes: Vec::new(),
    };
    sched.tick(now, &mut delegate);
    delegate.outcomes
}

fn online_rig(hub: MockHub) -> (Rig, Scheduler) {
    let mut r = rig(hub);
    r.service.set_link(LinkState::up(Ipv4Addr::new(10, 1, 1, 2)));
    let mut sched = Scheduler::new();
    sched.add("status", INTERVAL, r.clock.now());
    (r, sched)
}

#[test]
fn dead_hub_is_suppressed_then_probed() {
    let (mut r, mut sched) = online_rig(MockHub::always(HubReply::Refuse));

    for _ in 0..3 {
        assert_eq!(step(&mut r, &mut sched, INTERVAL), vec![DeliveryOutcome::TransportFailed]);
    }
    assert_eq!(r.hub.borrow().connects, 3);

    // Fourth tick inside the cooldown: no transport at all.
    assert_eq!(step(&mut r, &mut sched, INTERVAL), vec![DeliveryOutcome::Suppressed]);
    assert_eq!(r.hub.borrow().connects, 3);

    // Sit out the rest of the cooldown one interval at a time.
    let mut waited = INTERVAL;
    while waited + INTERVAL < COOLDOWN {
        assert_eq!(step(&mut r, &mut sched, INTERVAL), vec![DeliveryOutcome::Suppressed]);
        waited += INTERVAL;
    }
    assert_eq!(r.hub.borrow().connects, 3);

    // Past the cooldown: exactly one real attempt, which fails again.
    assert_eq!(step(&mut r, &mut sched, INTERVAL), vec![DeliveryOutcome::TransportFailed]);
    assert_eq!(r.hub.borrow().connects, 4);
    assert_eq!(step(&mut r, &mut sched, INTERVAL), vec![DeliveryOutcome::Suppressed]);
    assert_eq!(r.hub.borrow().connects, 4);

    let policy = r.service.reporter().policy();
    assert_eq!(policy.consecutive_failures(), policy.threshold());
}

#[test]
fn hub_recovery_resets_the_counter() {
    let hub = MockHub::scripted(
        vec![HubReply::Refuse, HubReply::Refuse, HubReply::Answer(OK)],
        HubReply::Answer(OK),
    );
    let (mut r, mut sched) = online_rig(hub);

    step(&mut r, &mut sched, INTERVAL);
    step(&mut r, &mut sched, INTERVAL);
    assert_eq!(r.service.reporter().policy().consecutive_failures(), 2);

    assert_eq!(
        step(&mut r, &mut sched, INTERVAL),
        vec![DeliveryOutcome::Sent { acknowledged: true }]
    );
    assert_eq!(r.service.reporter().policy().consecutive_failures(), 0);
}

#[test]
fn probe_success_reopens_regular_reporting() {
    let hub = MockHub::scripted(vec![HubReply::Refuse; 3], HubReply::Answer(OK));
    let (mut r, mut sched) = online_rig(hub);

    for _ in 0..3 {
        step(&mut r, &mut sched, INTERVAL);
    }
    r.clock.advance(COOLDOWN);
    assert_eq!(
        step(&mut r, &mut sched, INTERVAL),
        vec![DeliveryOutcome::Sent { acknowledged: true }]
    );
    assert_eq!(
        step(&mut r, &mut sched, INTERVAL),
        vec![DeliveryOutcome::Sent { acknowledged: true }]
    );
}

#[test]
fn schedule_keeps_phase_across_counter_wrap() {
    let mut r = rig(MockHub::always(HubReply::Answer(OK)));
    r.service.set_link(LinkState::up(Ipv4Addr::new(10, 1, 1, 2)));
    r.clock.set(u32::MAX - 30_000);
    let mut sched = Scheduler::new();
    sched.add("status", INTERVAL, r.clock.get());

    let mut fired = 0;
    for _ in 0..10 {
        fired += step(&mut r, &mut sched, INTERVAL / 2).len();
    }
    // 300 s elapsed across the wrap: five full intervals.
    assert_eq!(fired, 5);
}

#[test]
fn every_attempt_releases_its_connection() {
    let hub = MockHub::scripted(
        vec![HubReply::Answer(OK), HubReply::Silent, HubReply::Answer(b"HTTP/1.1 503 Busy\r\n")],
        HubReply::Refuse,
    );
    let (mut r, mut sched) = online_rig(hub);

    for _ in 0..4 {
        step(&mut r, &mut sched, INTERVAL);
    }
    let hub = r.hub.borrow();
    assert_eq!(hub.connects, 4);
    // The refused fourth attempt never opened a connection.
    assert_eq!(hub.released, 3);
}

#[test]
fn report_events_carry_trigger_and_outcome() {
    let (mut r, mut sched) = online_rig(MockHub::always(HubReply::Refuse));
    step(&mut r, &mut sched, INTERVAL);

    assert_eq!(
        r.sink.events,
        vec![AppEvent::Report {
            trigger: ReportTrigger::Scheduled,
            outcome: DeliveryOutcome::TransportFailed,
            consecutive_failures: 1,
        }]
    );
}
