//! Host run loops driven by mock adapters and a private event queue.

use std::sync::Arc;
use std::time::Duration;

use canpingpong::app::mapper::IndicatorState;
use canpingpong::app::ports::NullIndicator;
use canpingpong::app::service::HeartbeatService;
use canpingpong::config::{ProtocolConfig, RolePolicy};
use canpingpong::error::{Error, ReceiveError};
use canpingpong::events::{Event, EventQueue};
use canpingpong::frame::{self, WireFrame};
use canpingpong::runtime::host::{self, ExitReason, TickSchedule};

use super::mock_hw::{MockBus, MockIndicator, RecordingSink};

fn heartbeat(counter: u8) -> WireFrame {
    frame::encode(0x7FF, counter).to_wire()
}

fn bad_length() -> WireFrame {
    let mut f = frame::encode(0x7FF, 0);
    f.length = 4;
    f.to_wire()
}

fn pong_run(
    frames: Vec<WireFrame>,
    keep_going: bool,
) -> (host::RunReport, MockIndicator, RecordingSink) {
    let queue = Arc::new(EventQueue::new());
    let mut bus = MockBus::with_frames(frames);
    bus.shutdown_when_drained = Some(Arc::clone(&queue));

    let mut led = MockIndicator::new();
    let mut sink = RecordingSink::new();
    let service = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_pong(keep_going),
        bus,
        &mut led,
        NullIndicator,
    )
    .unwrap();
    let report = host::run_pong(service, &queue, &mut sink);
    (report, led, sink)
}

// ── Pong ──────────────────────────────────────────────────────

#[test]
fn pong_runs_until_termination_and_leaves_the_led_off() {
    let (report, led, _) = pong_run((0..4).map(heartbeat).collect(), false);

    assert_eq!(report.reason, ExitReason::Terminated);
    assert_eq!(report.reason.exit_code(), 0);
    assert_eq!(report.receive.accepted, 4);
    use IndicatorState::{Off, On};
    assert_eq!(led.calls, vec![Off, Off, On, Off, On, Off]);
}

#[test]
fn pong_exits_on_a_malformed_frame_by_default() {
    let (report, led, _) = pong_run(vec![heartbeat(1), bad_length(), heartbeat(3)], false);

    assert_eq!(
        report.reason,
        ExitReason::Fatal(Error::Receive(ReceiveError::BadShape { length: 4 }))
    );
    assert_eq!(report.reason.exit_code(), 1);
    assert_eq!(report.receive.accepted, 1, "frames after the bad one are not read");
    assert_eq!(led.last(), Some(IndicatorState::Off), "cleanup still ran");
}

#[test]
fn pong_keep_going_survives_malformed_frames() {
    let (report, _, _) = pong_run(vec![bad_length(), heartbeat(1), bad_length(), heartbeat(2)], true);

    assert_eq!(report.reason, ExitReason::Terminated);
    assert_eq!(report.receive.accepted, 2);
    assert_eq!(report.receive.malformed, 2);
}

#[test]
fn pong_sees_a_pending_termination_before_reading() {
    let queue = EventQueue::new();
    queue.push(Event::Shutdown);
    let mut sink = RecordingSink::new();
    let service = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_pong(false),
        MockBus::with_frames([heartbeat(1)]),
        NullIndicator,
        NullIndicator,
    )
    .unwrap();

    let report = host::run_pong(service, &queue, &mut sink);
    assert_eq!(report.reason, ExitReason::Terminated);
    assert_eq!(report.receive.accepted, 0);
}

// ── Ping ──────────────────────────────────────────────────────

#[test]
fn ping_transmits_on_schedule_until_termination() {
    let queue = Arc::new(EventQueue::new());
    let mut bus = MockBus::new();
    bus.shutdown_after_writes = Some((3, Arc::clone(&queue)));

    let mut sink = RecordingSink::new();
    let service = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_ping(),
        bus,
        NullIndicator,
        NullIndicator,
    )
    .unwrap();
    let schedule = TickSchedule {
        initial_delay: Duration::from_millis(2),
        period: Duration::from_millis(1),
    };

    let report = host::run_ping(service, queue, schedule, &mut sink);

    assert_eq!(report.reason, ExitReason::Terminated);
    assert!(report.stats.ticks >= 3, "ticks: {}", report.stats.ticks);
    assert_eq!(report.stats.short_writes, 0);
}

#[test]
fn ping_short_writes_do_not_stop_the_run() {
    let queue = Arc::new(EventQueue::new());
    let mut bus = MockBus::new();
    bus.write_script.extend([Ok(16), Ok(4)]);
    bus.shutdown_after_writes = Some((4, Arc::clone(&queue)));

    let mut sink = RecordingSink::new();
    let service = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_ping(),
        bus,
        NullIndicator,
        NullIndicator,
    )
    .unwrap();
    let schedule = TickSchedule {
        initial_delay: Duration::from_millis(1),
        period: Duration::from_millis(1),
    };

    let report = host::run_ping(service, queue, schedule, &mut sink);

    assert_eq!(report.reason, ExitReason::Terminated);
    assert_eq!(report.stats.short_writes, 1);
    assert!(report.stats.ticks >= 4);
}
