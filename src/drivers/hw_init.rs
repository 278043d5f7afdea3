//! One-shot GPIO interrupt setup and the monotonic clock.
//!
//! Configures the fault-clear button as a falling-edge interrupt source
//! using raw ESP-IDF sys calls.  Called once from `main()` before the
//! event loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::error::DeviceError;
#[cfg(target_os = "espidf")]
use crate::events::{Event, ISR_EVENTS};
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Clock ─────────────────────────────────────────────────────

/// Milliseconds since boot, wrapping.
#[cfg(target_os = "espidf")]
pub fn now_ms() -> u32 {
    // SAFETY: esp_timer_get_time is a counter read with no preconditions.
    (unsafe { esp_timer_get_time() } / 1_000) as u32
}

/// Milliseconds since first call, wrapping.
#[cfg(not(target_os = "espidf"))]
pub fn now_ms() -> u32 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u32
}

// ── Button ISR ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    ISR_EVENTS.push(Event::ButtonEdge);
}

/// Configure the button pin and register its falling-edge handler.
#[cfg(target_os = "espidf")]
pub fn init_button_isr() -> Result<(), DeviceError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BUTTON_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        ..Default::default()
    };

    // SAFETY: called once from the main task before the event loop.  The
    // handler is a static function that only pushes to the lock-free queue.
    unsafe {
        let ret = gpio_config(&cfg);
        if ret != ESP_OK as i32 {
            return Err(DeviceError::Driver { op: "gpio_config(button)", code: ret });
        }

        // ESP_ERR_INVALID_STATE: service already installed, which is fine.
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(DeviceError::Driver { op: "gpio_install_isr_service", code: ret });
        }

        let ret = gpio_isr_handler_add(pins::BUTTON_GPIO, Some(button_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(DeviceError::Driver { op: "gpio_isr_handler_add", code: ret });
        }
        gpio_intr_enable(pins::BUTTON_GPIO);
    }

    info!("hw_init: button ISR on GPIO{}", pins::BUTTON_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_isr() -> Result<(), DeviceError> {
    log::info!("hw_init(sim): button ISR not installed");
    Ok(())
}
