//! Bind / start / shutdown ordering and cleanup.

use canpingpong::app::events::AppEvent;
use canpingpong::app::mapper::IndicatorState;
use canpingpong::app::ports::NullIndicator;
use canpingpong::app::service::HeartbeatService;
use canpingpong::config::{ProtocolConfig, RolePolicy};
use canpingpong::error::{ConfigError, Error};
use canpingpong::frame;
use canpingpong::runtime::lifecycle::LifecycleState;

use super::mock_hw::{MockBus, MockIndicator, RecordingSink};

#[test]
fn bind_forces_outputs_off_and_reaches_bound() {
    let mut led = MockIndicator::new();
    let mut fault = MockIndicator::new();
    let svc = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_pong(false),
        MockBus::new(),
        &mut led,
        &mut fault,
    )
    .unwrap();
    assert_eq!(svc.lifecycle_state(), LifecycleState::Bound);
    drop(svc);
    assert_eq!(led.calls, vec![IndicatorState::Off]);
    assert_eq!(fault.calls, vec![IndicatorState::Off]);
}

#[test]
fn bind_rejects_a_zero_tick_interval() {
    let config = ProtocolConfig {
        tick_interval_ms: 0,
        ..ProtocolConfig::default()
    };
    let r = HeartbeatService::bind(
        config,
        RolePolicy::host_ping(),
        MockBus::new(),
        NullIndicator,
        NullIndicator,
    );
    assert!(matches!(r, Err(Error::Config(ConfigError::ZeroTickInterval))));
}

#[test]
fn bind_fails_when_the_indicator_cannot_be_driven() {
    let led = MockIndicator {
        fail_from: Some(0),
        ..MockIndicator::default()
    };
    let r = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_pong(false),
        MockBus::new(),
        led,
        NullIndicator,
    );
    assert!(matches!(r, Err(Error::Indicator(_))));
}

#[test]
fn shutdown_turns_the_indicator_off_exactly_once() {
    let mut led = MockIndicator::new();
    let mut sink = RecordingSink::new();
    let bus = MockBus::with_frames([frame::encode(0x7FF, 1).to_wire()]);
    let mut svc = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_pong(false),
        bus,
        &mut led,
        NullIndicator,
    )
    .unwrap();
    svc.start(&mut sink).unwrap();
    svc.receive_one(&mut sink).unwrap();
    svc.shutdown(&mut sink).unwrap();

    use IndicatorState::{Off, On};
    assert_eq!(led.calls, vec![Off, On, Off]);
    assert_eq!(sink.count(|e| *e == AppEvent::Stopped), 1);
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::Stopped),
        "Stopped is the final event"
    );
}

#[test]
fn shutdown_from_bound_is_allowed() {
    let mut sink = RecordingSink::new();
    let svc = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_ping(),
        MockBus::new(),
        NullIndicator,
        NullIndicator,
    )
    .unwrap();
    svc.shutdown(&mut sink).unwrap();
    assert!(sink.events.contains(&AppEvent::LifecycleChanged {
        from: LifecycleState::Bound,
        to: LifecycleState::ShuttingDown,
    }));
}

#[test]
fn start_twice_is_a_lifecycle_error() {
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
    assert!(matches!(svc.start(&mut sink), Err(Error::Lifecycle(_))));
    assert_eq!(svc.lifecycle_state(), LifecycleState::Running);
}

#[test]
fn shutdown_reports_an_indicator_failure_but_still_stops() {
    let led = MockIndicator {
        fail_from: Some(1),
        ..MockIndicator::default()
    };
    let mut sink = RecordingSink::new();
    let mut svc = HeartbeatService::bind(
        ProtocolConfig::default(),
        RolePolicy::host_pong(false),
        MockBus::new(),
        led,
        NullIndicator,
    )
    .unwrap();
    svc.start(&mut sink).unwrap();

    assert!(matches!(svc.shutdown(&mut sink), Err(Error::Indicator(_))));
    assert!(sink.events.contains(&AppEvent::Stopped));
}
