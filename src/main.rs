//! CAN heartbeat node firmware (ESP32-S3).
//!
//! Runs ping and pong on one node:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  esp_timer ──PingTick──┐                                      │
//! │  button ISR ─ButtonEdge┼──▶ ISR_EVENTS ──▶ NodeDispatcher     │
//! │  TWAI RX alert ────────┘    (lock-free)        │              │
//! │                                                ▼              │
//! │                                        HeartbeatService       │
//! │              TWAI ◀── BusPort ──┤  pong LED · fault LED       │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! LEDs: ready (setup done), activity (toggles per transmit), pong
//! (parity of the last valid counter), fault (latched; button clears).
//! If any setup step fails after the LEDs are up, the fault LED is lit
//! and the node halts.
#![deny(unused_must_use)]

use core::fmt::Display;

use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::peripherals::Peripherals;
use log::info;

use canpingpong::adapters::log_sink::LogEventSink;
use canpingpong::adapters::pin_indicator::PinIndicator;
use canpingpong::app::mapper::IndicatorState;
use canpingpong::app::ports::{BusPort, IndicatorPort};
use canpingpong::app::service::HeartbeatService;
use canpingpong::config::{BitTiming, BusMode, ProtocolConfig, RolePolicy};
use canpingpong::drivers::{hw_init, hw_timer, twai};
use canpingpong::events::{Event, ISR_EVENTS};
use canpingpong::pins;
use canpingpong::runtime::embedded::{NodeDispatcher, signal_setup_failure};

/// Switch to `SelfTest` to exercise a single node without a peer.
const BUS_MODE: BusMode = BusMode::Normal;

/// Longest the main task sleeps waiting for an RX alert.  Timer and
/// button events are picked up at least this often.
const RX_WAIT_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("canpong-node v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. LEDs ───────────────────────────────────────────────
    // `PinDriver` takes the typed pin, so each gpioN must match `pins`:
    // 15 READY_LED_GPIO, 14 FAULT_LED_GPIO, 12 PONG_LED_GPIO,
    // 13 ACTIVITY_LED_GPIO.
    let peripherals = Peripherals::take()?;
    let mut ready_led = PinIndicator::new(PinDriver::output(peripherals.pins.gpio15)?);
    let mut fault_led = PinIndicator::new(PinDriver::output(peripherals.pins.gpio14)?);
    let pong_led = PinIndicator::new(PinDriver::output(peripherals.pins.gpio12)?);
    let activity_led = PinIndicator::new(PinDriver::output(peripherals.pins.gpio13)?);

    // ── 3. CAN controller, interrupts and tick timer ──────────
    let config = ProtocolConfig::default();
    let bus = match twai::install(
        pins::TWAI_TX_GPIO,
        pins::TWAI_RX_GPIO,
        BitTiming::ESP32_500K,
        BUS_MODE,
    ) {
        Ok(bus) => bus,
        Err(e) => halt(&mut fault_led, &e),
    };
    if let Err(e) = hw_init::init_button_isr() {
        halt(&mut fault_led, &e);
    }
    // Ticks queue up in ISR_EVENTS until the event loop starts.
    if let Err(e) = hw_timer::start_tick_timer(config.initial_delay_ms, config.tick_interval_ms) {
        halt(&mut fault_led, &e);
    }

    // ── 4. Bind and start ─────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut service = match HeartbeatService::bind(
        config,
        RolePolicy::embedded(),
        bus,
        pong_led,
        &mut fault_led,
    ) {
        Ok(service) => service,
        Err(e) => halt(&mut fault_led, &e),
    };
    if let Err(e) = service.start(&mut sink) {
        drop(service);
        halt(&mut fault_led, &e);
    }
    if let Err(e) = ready_led.set(IndicatorState::On) {
        drop(service);
        halt(&mut fault_led, &e);
    }
    info!("node ready ({:?} mode)", service.bus_mut().mode());

    // ── 5. Event loop ─────────────────────────────────────────
    let mut dispatcher = NodeDispatcher::new(activity_led);
    loop {
        let bus = service.bus_mut();
        if bus.wait_for_rx(RX_WAIT_MS) || bus.frame_pending() {
            ISR_EVENTS.push(Event::FramePending);
        }
        dispatcher.dispatch(&ISR_EVENTS, &mut service, hw_init::now_ms(), &mut sink);
    }
}

fn halt(fault_led: &mut impl IndicatorPort, e: &dyn Display) -> ! {
    signal_setup_failure(fault_led, e);
    loop {
        FreeRtos::delay_ms(1000);
    }
}
