//! Ping tick timer using ESP-IDF's esp_timer API.
//!
//! A one-shot timer covers the initial delay; its callback arms the
//! periodic timer and emits the first tick.  Both callbacks only push
//! [`Event::PingTick`] into the ISR event queue; a failure to arm the
//! periodic timer is reported as [`Event::TimerFault`].
//!
//! Callbacks execute in the esp_timer task context (not an ISR).

use crate::error::DeviceError;
use crate::events::{Event, ISR_EVENTS};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
static mut FIRST_TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut PERIODIC_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut PERIOD_US: u64 = 0;

/// Push one tick.  Shared by both callbacks and the simulation path.
fn emit_tick() {
    if !ISR_EVENTS.push(Event::PingTick) {
        log::warn!("hw_timer: tick dropped, event queue full");
    }
}

fn emit_timer_fault() {
    if !ISR_EVENTS.push(Event::TimerFault) {
        log::warn!("hw_timer: timer fault dropped, event queue full");
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn periodic_tick_cb(_arg: *mut core::ffi::c_void) {
    emit_tick();
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn first_tick_cb(_arg: *mut core::ffi::c_void) {
    // SAFETY: PERIODIC_TIMER and PERIOD_US are written in start_tick_timer()
    // before the one-shot timer is armed, and never again.
    unsafe {
        let ret = esp_timer_start_periodic(PERIODIC_TIMER, PERIOD_US);
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: periodic start failed (rc={})", ret);
            emit_timer_fault();
        }
    }
    emit_tick();
}

#[cfg(target_os = "espidf")]
unsafe fn create_timer(
    callback: unsafe extern "C" fn(*mut core::ffi::c_void),
    name: &'static [u8],
    out: *mut esp_timer_handle_t,
) -> Result<(), DeviceError> {
    let args = esp_timer_create_args_t {
        callback: Some(callback),
        arg: core::ptr::null_mut(),
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: name.as_ptr() as *const _,
        skip_unhandled_events: true,
    };
    // SAFETY: `out` points at one of this module's handle statics.
    let ret = unsafe { esp_timer_create(&args, out) };
    if ret != ESP_OK as i32 {
        return Err(DeviceError::Driver { op: "esp_timer_create", code: ret });
    }
    Ok(())
}

/// Arm the tick: first after `initial_delay_ms`, then every `period_ms`.
#[cfg(target_os = "espidf")]
pub fn start_tick_timer(initial_delay_ms: u32, period_ms: u32) -> Result<(), DeviceError> {
    // SAFETY: the handle statics are written here once at boot from the
    // main task, before either callback can fire.
    unsafe {
        PERIOD_US = u64::from(period_ms) * 1_000;
        create_timer(periodic_tick_cb, b"ping_tick\0", &raw mut PERIODIC_TIMER)?;
        create_timer(first_tick_cb, b"ping_first\0", &raw mut FIRST_TICK_TIMER)?;

        let ret = esp_timer_start_once(FIRST_TICK_TIMER, u64::from(initial_delay_ms) * 1_000);
        if ret != ESP_OK as i32 {
            return Err(DeviceError::Driver { op: "esp_timer_start_once", code: ret });
        }
    }
    info!("hw_timer: first tick in {} ms, then every {} ms", initial_delay_ms, period_ms);
    Ok(())
}

/// Simulation: no timer hardware.  Ticks are injected with [`sim_tick`].
#[cfg(not(target_os = "espidf"))]
pub fn start_tick_timer(initial_delay_ms: u32, period_ms: u32) -> Result<(), DeviceError> {
    log::info!(
        "hw_timer(sim): tick not armed ({} ms, then every {} ms)",
        initial_delay_ms,
        period_ms
    );
    Ok(())
}

/// Simulation: behave as if the timer fired once.
#[cfg(not(target_os = "espidf"))]
pub fn sim_tick() {
    emit_tick();
}

/// Simulation: behave as if the periodic phase failed to arm.
#[cfg(not(target_os = "espidf"))]
pub fn sim_periodic_start_failure() {
    emit_timer_fault();
}
