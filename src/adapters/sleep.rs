//! Light-sleep adapter.
//!
//! Implements [`SleepPort`] with ESP-IDF light sleep:
//!
//! - The button line gets a falling-edge GPIO ISR that only records the
//!   edge on [`ControllerState`]; the `&'static` state is passed as the
//!   handler argument, so there are no other globals.
//! - Before sleeping, the button is armed as a level wake source: LOW when
//!   released (a press wakes us), HIGH while held (the release wakes us, so
//!   a held button cannot spin the loop). The edge interrupt is masked for
//!   as long as the pin is in level mode and unmasked once the falling-edge
//!   type is restored after waking.
//! - Edges the ISR drops while a press is in flight are counted here, not
//!   on the controller state.
//! - A timer wake bounds every sleep.
//! - A `CPU_FREQ_MAX` power-management lock is held while awake so press
//!   handling never runs at a reduced clock.
//!
//! On the host, `suspend` sleeps briefly and reports a timer wake.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::info;

use crate::app::ports::{SleepPort, WakeCause};
use crate::app::state::ControllerState;
use crate::error::Result;

#[cfg(target_os = "espidf")]
use crate::error::Error;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
const SIM_SLEEP_MS: u32 = 20;

pub struct LightSleep {
    button_gpio: i32,
    armed: bool,
    shutdown: AtomicBool,
    #[cfg(target_os = "espidf")]
    pm_lock: Option<esp_pm_lock_handle_t>,
    #[cfg(target_os = "espidf")]
    woke_on_press_level: bool,
}

static DROPPED_EDGES: AtomicU32 = AtomicU32::new(0);

/// Pin reconfiguration around one light sleep.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinStep {
    MaskEdgeIrq,
    /// `high` while the button is held, so only the release wakes us.
    LevelWake { high: bool },
    DisableLevelWake,
    RestoreNegEdge,
    UnmaskEdgeIrq,
}

/// A level-type interrupt left enabled fires continuously while the level
/// holds, so the edge ISR is masked before the pin switches to level mode.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn arm_steps(held: bool) -> [PinStep; 2] {
    [PinStep::MaskEdgeIrq, PinStep::LevelWake { high: held }]
}

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const RESTORE_STEPS: [PinStep; 3] =
    [PinStep::DisableLevelWake, PinStep::RestoreNegEdge, PinStep::UnmaskEdgeIrq];

#[cfg(target_os = "espidf")]
fn apply(gpio: i32, step: PinStep) {
    let ret = unsafe {
        match step {
            PinStep::MaskEdgeIrq => gpio_intr_disable(gpio),
            PinStep::LevelWake { high: true } => {
                gpio_wakeup_enable(gpio, gpio_int_type_t_GPIO_INTR_HIGH_LEVEL)
            }
            PinStep::LevelWake { high: false } => {
                gpio_wakeup_enable(gpio, gpio_int_type_t_GPIO_INTR_LOW_LEVEL)
            }
            PinStep::DisableLevelWake => gpio_wakeup_disable(gpio),
            PinStep::RestoreNegEdge => gpio_set_intr_type(gpio, gpio_int_type_t_GPIO_INTR_NEGEDGE),
            PinStep::UnmaskEdgeIrq => gpio_intr_enable(gpio),
        }
    };
    if ret != ESP_OK {
        warn!("LightSleep: {:?} on GPIO{} returned {}", step, gpio, ret);
    }
}

/// ISR body: record the edge, count it if the controller refused it.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn record_edge(state: &ControllerState, now_ms: u32) {
    if !state.on_edge(now_ms) {
        DROPPED_EDGES.fetch_add(1, Ordering::Relaxed);
    }
}

/// Button edge ISR. Runs in interrupt context: atomics only.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static ControllerState` registered in
    // `LightSleep::new`; it is never freed.
    let state = unsafe { &*(arg as *const ControllerState) };
    let now_ms = (unsafe { esp_timer_get_time() } / 1000) as u32;
    record_edge(state, now_ms);
}

impl LightSleep {
    /// Register the button ISR and create the PM lock.
    #[cfg(target_os = "espidf")]
    pub fn new(button_gpio: i32, state: &'static ControllerState) -> Result<Self> {
        unsafe {
            let ret = gpio_install_isr_service(0);
            // Already installed by another driver is fine.
            if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
                return Err(Error::Init("gpio isr service"));
            }
            if gpio_set_intr_type(button_gpio, gpio_int_type_t_GPIO_INTR_NEGEDGE) != ESP_OK {
                return Err(Error::Init("button interrupt type"));
            }
            let arg = state as *const ControllerState as *mut core::ffi::c_void;
            if gpio_isr_handler_add(button_gpio, Some(button_isr), arg) != ESP_OK {
                return Err(Error::Init("button isr handler"));
            }
            if gpio_intr_enable(button_gpio) != ESP_OK {
                return Err(Error::Init("button interrupt enable"));
            }
        }

        let mut handle: esp_pm_lock_handle_t = core::ptr::null_mut();
        let ret = unsafe {
            esp_pm_lock_create(
                esp_pm_lock_type_t_ESP_PM_CPU_FREQ_MAX,
                0,
                c"gatelock".as_ptr(),
                &mut handle,
            )
        };
        let pm_lock = if ret == ESP_OK {
            unsafe { esp_pm_lock_acquire(handle) };
            Some(handle)
        } else {
            // Power management disabled in sdkconfig: the CPU already runs
            // at its fixed frequency.
            info!("LightSleep: no PM lock ({}), fixed CPU frequency", ret);
            None
        };

        info!("LightSleep: button GPIO{} armed for edge + wake", button_gpio);
        Ok(Self {
            button_gpio,
            armed: false,
            shutdown: AtomicBool::new(false),
            pm_lock,
            woke_on_press_level: false,
        })
    }

    /// Host simulation: no ISR, no wake sources.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(button_gpio: i32, _state: &'static ControllerState) -> Result<Self> {
        info!("LightSleep(sim): button GPIO{}", button_gpio);
        Ok(Self {
            button_gpio,
            armed: false,
            shutdown: AtomicBool::new(false),
        })
    }

    /// Ask the loop to stop at its next wake (debug/interactive builds).
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn button_gpio(&self) -> i32 {
        self.button_gpio
    }

    /// Edges the ISR discarded while a press was in flight, since boot.
    pub fn dropped_edges() -> u32 {
        DROPPED_EDGES.load(Ordering::Relaxed)
    }

    /// Whether the button wake source is armed for the next sleep.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    #[cfg(target_os = "espidf")]
    fn sleep_once(&mut self, max_ms: u32) -> WakeCause {
        if let Some(lock) = self.pm_lock {
            unsafe { esp_pm_lock_release(lock) };
        }

        unsafe { esp_sleep_enable_timer_wakeup(u64::from(max_ms) * 1000) };

        self.woke_on_press_level = false;
        if self.armed {
            let held = unsafe { gpio_get_level(self.button_gpio) } == 0;
            self.woke_on_press_level = !held;
            for step in arm_steps(held) {
                apply(self.button_gpio, step);
            }
        }

        let ret = unsafe { esp_light_sleep_start() };
        if ret != ESP_OK {
            warn!("LightSleep: esp_light_sleep_start returned {}", ret);
        }

        // An edge masked during sleep is not lost: a press wake is reported
        // as `WakeCause::Button` and handled at the current uptime.
        for step in RESTORE_STEPS {
            apply(self.button_gpio, step);
        }
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        self.armed = false;

        if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_GPIO && self.woke_on_press_level {
            WakeCause::Button
        } else if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER {
            WakeCause::Timer
        } else {
            WakeCause::Other
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep_once(&mut self, max_ms: u32) -> WakeCause {
        self.armed = false;
        std::thread::sleep(std::time::Duration::from_millis(u64::from(max_ms.min(SIM_SLEEP_MS))));
        WakeCause::Timer
    }
}

impl SleepPort for LightSleep {
    #[cfg(target_os = "espidf")]
    fn arm_button_wake(&mut self) -> Result<()> {
        if unsafe { esp_sleep_enable_gpio_wakeup() } != ESP_OK {
            return Err(Error::Init("gpio wake source"));
        }
        self.armed = true;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn arm_button_wake(&mut self) -> Result<()> {
        self.armed = true;
        Ok(())
    }

    fn suspend(&mut self, max_ms: u32) -> WakeCause {
        if self.shutdown.load(Ordering::Acquire) {
            return WakeCause::Shutdown;
        }
        self.sleep_once(max_ms)
    }

    #[cfg(target_os = "espidf")]
    fn restore_full_speed(&mut self) {
        if let Some(lock) = self.pm_lock {
            unsafe { esp_pm_lock_acquire(lock) };
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn restore_full_speed(&mut self) {}
}
