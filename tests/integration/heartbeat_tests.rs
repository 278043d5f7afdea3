//! Transmit → bus → receive → indicator, through the service core.

use canpingpong::app::events::AppEvent;
use canpingpong::app::fault::{FaultCause, FaultState};
use canpingpong::app::mapper::IndicatorState;
use canpingpong::app::ports::NullIndicator;
use canpingpong::app::service::{HeartbeatService, is_malformed};
use canpingpong::app::transmitter::TransmitOutcome;
use canpingpong::config::{ProtocolConfig, RolePolicy};
use canpingpong::error::{Error, ReceiveError};
use canpingpong::frame::{self, WireFrame};

use super::mock_hw::{MockBus, MockIndicator, RecordingSink};

fn heartbeat(id: u32, counter: u8) -> WireFrame {
    frame::encode(id, counter).to_wire()
}

fn pinger() -> (HeartbeatService<MockBus, NullIndicator, NullIndicator>, RecordingSink) {
    let mut sink = RecordingSink::new();
    let mut svc = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_ping(),
        MockBus::new(),
        NullIndicator,
        NullIndicator,
    )
    .unwrap();
    svc.start(&mut sink).unwrap();
    (svc, sink)
}

fn ponger(
    bus: MockBus,
    policy: RolePolicy,
) -> (HeartbeatService<MockBus, MockIndicator, MockIndicator>, RecordingSink) {
    let mut sink = RecordingSink::new();
    let mut svc = HeartbeatService::bind(
        ProtocolConfig::default(),
        policy,
        bus,
        MockIndicator::new(),
        MockIndicator::new(),
    )
    .unwrap();
    svc.start(&mut sink).unwrap();
    (svc, sink)
}

// ── Transmit ──────────────────────────────────────────────────

#[test]
fn ticks_send_consecutive_counters_from_zero() {
    let (mut svc, mut sink) = pinger();
    for _ in 0..5 {
        assert!(svc.on_tick(&mut sink).is_sent());
    }
    assert_eq!(svc.bus_mut().sent_counters(), vec![0, 1, 2, 3, 4]);
    assert_eq!(svc.next_counter(), 5);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::PingSent { .. })), 5);
}

#[test]
fn counter_wraps_after_255() {
    let (mut svc, mut sink) = pinger();
    for _ in 0..258 {
        svc.on_tick(&mut sink);
    }
    let sent = svc.bus_mut().sent_counters();
    assert_eq!(&sent[254..], &[254, 255, 0, 1]);
}

#[test]
fn every_frame_uses_the_configured_identifier_and_one_byte() {
    let (mut svc, mut sink) = pinger();
    svc.on_tick(&mut sink);
    let f = frame::decode(&svc.bus_mut().sent[0]).unwrap();
    assert_eq!(f.identifier, 0x7FF);
    assert_eq!(f.length, 1);
}

#[test]
fn short_write_is_reported_and_the_counter_still_advances() {
    let (mut svc, mut sink) = pinger();
    svc.bus_mut().write_script.extend([Ok(16), Ok(16), Ok(8)]);

    let outcomes: Vec<_> = (0..5).map(|_| svc.on_tick(&mut sink)).collect();

    assert_eq!(
        outcomes[2],
        TransmitOutcome::ShortWrite {
            counter: 2,
            written: 8
        }
    );
    assert_eq!(outcomes[3], TransmitOutcome::Sent { counter: 3 });
    assert_eq!(outcomes[4], TransmitOutcome::Sent { counter: 4 });
    assert_eq!(svc.bus_mut().sent_counters(), vec![0, 1, 2, 3, 4]);
    assert_eq!(svc.stats().short_writes, 1);
    assert_eq!(svc.stats().ticks, 5);
    // Host ping policy: reported, not latched.
    assert_eq!(svc.fault_state(), FaultState::Clear);
}

// ── Receive ───────────────────────────────────────────────────

#[test]
fn foreign_frames_never_touch_the_indicator() {
    // Each foreign frame carries the opposite parity of the indicator's
    // current level.
    let bus = MockBus::with_frames([
        heartbeat(0x123, 1),
        heartbeat(0x7FF, 1),
        heartbeat(0x123, 2),
        heartbeat(0x7FF, 2),
        heartbeat(0x123, 5),
        heartbeat(0x123, 7),
        heartbeat(0x7FF, 3),
    ]);
    let (mut svc, mut sink) = ponger(bus, RolePolicy::host_pong(false));

    let mut accepted = Vec::new();
    let mut after_each = Vec::new();
    for _ in 0..7 {
        if let Some(c) = svc.receive_one(&mut sink).unwrap() {
            accepted.push(c);
        }
        after_each.push(svc.indicator_state());
    }

    use IndicatorState::{Off, On};
    assert_eq!(accepted, vec![1, 2, 3]);
    assert_eq!(after_each, vec![Off, On, On, Off, Off, Off, On]);
    let counts = svc.receive_counts();
    assert_eq!((counts.accepted, counts.foreign, counts.malformed), (3, 4, 0));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::PongReceived { .. })), 3);
    assert_eq!(svc.indicator_state(), IndicatorState::On);
}

#[test]
fn wrong_length_raises_the_fault() {
    let mut bad = frame::encode(0x7FF, 9);
    bad.length = 2;
    let (mut svc, mut sink) = ponger(MockBus::with_frames([bad.to_wire()]), RolePolicy::host_pong(false));

    let err = svc.receive_one(&mut sink).unwrap_err();

    assert_eq!(err, Error::Receive(ReceiveError::BadShape { length: 2 }));
    assert!(is_malformed(&err));
    assert_eq!(svc.fault_state(), FaultState::Set);
    assert_eq!(svc.fault_cause(), Some(FaultCause::BadShape));
    assert!(sink.events.contains(&AppEvent::FaultRaised(FaultCause::BadShape)));
    // The indicator is untouched by the bad frame.
    assert_eq!(svc.indicator_state(), IndicatorState::Off);
}

#[test]
fn wrong_length_is_malformed_even_for_foreign_ids() {
    let mut bad = frame::encode(0x100, 0);
    bad.length = 0;
    let (mut svc, mut sink) = ponger(MockBus::with_frames([bad.to_wire()]), RolePolicy::host_pong(false));
    let err = svc.receive_one(&mut sink).unwrap_err();
    assert!(is_malformed(&err));
}

#[test]
fn truncated_read_is_malformed() {
    let mut bus = MockBus::new();
    bus.push_raw(&heartbeat(0x7FF, 1)[..10]);
    let (mut svc, mut sink) = ponger(bus, RolePolicy::host_pong(false));

    let err = svc.receive_one(&mut sink).unwrap_err();
    assert_eq!(err, Error::Receive(ReceiveError::Truncated { got: 10 }));
    assert_eq!(svc.fault_cause(), Some(FaultCause::Truncated));
}

#[test]
fn extended_and_remote_frames_are_foreign() {
    const CAN_EFF_FLAG: u32 = 0x8000_0000;
    const CAN_RTR_FLAG: u32 = 0x4000_0000;
    let bus = MockBus::with_frames([
        heartbeat(0x7FF | CAN_EFF_FLAG, 1),
        heartbeat(0x7FF | CAN_RTR_FLAG, 1),
    ]);
    let (mut svc, mut sink) = ponger(bus, RolePolicy::host_pong(false));

    assert_eq!(svc.receive_one(&mut sink), Ok(None));
    assert_eq!(svc.receive_one(&mut sink), Ok(None));
    assert_eq!(svc.receive_counts().foreign, 2);
}

#[test]
fn empty_bus_reads_as_nothing() {
    let (mut svc, mut sink) = ponger(MockBus::new(), RolePolicy::host_pong(false));
    assert_eq!(svc.receive_one(&mut sink), Ok(None));
    assert_eq!(svc.fault_state(), FaultState::Clear);
}

// ── End to end ────────────────────────────────────────────────

#[test]
fn indicator_follows_counter_parity_end_to_end() {
    let (mut ping, mut ping_sink) = pinger();
    for _ in 0..5 {
        ping.on_tick(&mut ping_sink);
    }
    let wires = ping.bus_mut().sent.clone();

    let (mut pong, mut pong_sink) = ponger(MockBus::with_frames(wires), RolePolicy::host_pong(false));
    let mut received = Vec::new();
    for _ in 0..5 {
        received.push(pong.receive_one(&mut pong_sink).unwrap().unwrap());
    }
    pong.shutdown(&mut pong_sink).unwrap();

    assert_eq!(received, vec![0, 1, 2, 3, 4]);
    let levels: Vec<IndicatorState> = pong_sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::PongReceived { indicator, .. } => Some(*indicator),
            _ => None,
        })
        .collect();
    use IndicatorState::{Off, On};
    assert_eq!(levels, vec![Off, On, Off, On, Off]);
}

#[test]
fn malformed_frame_does_not_lose_later_good_frames() {
    let mut bad = frame::encode(0x7FF, 0);
    bad.length = 3;
    let bus = MockBus::with_frames([bad.to_wire(), heartbeat(0x7FF, 7)]);
    let (mut svc, mut sink) = ponger(bus, RolePolicy::embedded());

    assert!(svc.receive_one(&mut sink).is_err());
    assert_eq!(svc.receive_one(&mut sink), Ok(Some(7)));
    // Latched until explicitly cleared.
    assert_eq!(svc.fault_state(), FaultState::Set);
    assert!(svc.clear_fault(&mut sink));
    assert_eq!(svc.fault_state(), FaultState::Clear);
}
