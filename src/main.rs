//! Gatelock Firmware — Main Entry Point
//!
//! Hexagonal architecture around a light-sleep loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GateLines        Esp32TimeAdapter   LightSleep   SntpClockSync │
//! │  (Inputs+Outputs) (Timebase+Clock)   (SleepPort)  (ClockSync)   │
//! │  NvsConfigStore   LogEventSink       TaskWatchdog              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              GateService (pure logic)                  │    │
//! │  │  guard · peer handshake · policy · actuation           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  PowerScheduler (boot · sleep/wake · daily sync)               │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use gatelock::adapters::board::Board;
use gatelock::adapters::lines::GateLines;
use gatelock::adapters::log_sink::LogEventSink;
use gatelock::adapters::nvs::NvsConfigStore;
use gatelock::adapters::sleep::LightSleep;
use gatelock::adapters::sntp::SntpClockSync;
use gatelock::adapters::time::Esp32TimeAdapter;
use gatelock::app::ports::{ConfigError, ConfigPort};
use gatelock::app::service::GateService;
use gatelock::app::state::ControllerState;
use gatelock::config::GateConfig;
use gatelock::drivers::watchdog::TaskWatchdog;
use gatelock::pins;
use gatelock::power::PowerScheduler;

/// Shared with the button ISR.
static CONTROLLER: ControllerState = ControllerState::new();

type InPin = PinDriver<'static, AnyIOPin, Input>;
type OutPin = PinDriver<'static, AnyOutputPin, Output>;

fn input(pin: AnyIOPin, pull: Pull) -> Result<InPin> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(pull)?;
    Ok(driver)
}

fn output(pin: AnyOutputPin) -> Result<OutPin> {
    let mut driver = PinDriver::output(pin)?;
    driver.set_low()?;
    Ok(driver)
}

/// Load the stored config, falling back to defaults.
///
/// Defaults are written back only when nothing was stored; a corrupt or
/// invalid blob is left alone for inspection.
fn load_config(store: &NvsConfigStore) -> GateConfig {
    match store.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(ConfigError::NotFound) => {
            info!("No stored config, persisting defaults");
            let cfg = GateConfig::default();
            if let Err(e) = store.save(&cfg) {
                warn!("Saving default config failed: {}", e);
            }
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            GateConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Gatelock v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Config ─────────────────────────────────────────────
    let config = match NvsConfigStore::new() {
        Ok(store) => load_config(&store),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            GateConfig::default()
        }
    };
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config not printable: {}", e),
    }

    // ── 3. Lines ──────────────────────────────────────────────
    let p = peripherals.pins;
    let lines = GateLines {
        button: input(p.gpio25.downgrade(), Pull::Up)?,
        peer_detect: input(p.gpio32.downgrade(), Pull::Up)?,
        peer_response: input(p.gpio13.downgrade(), Pull::Down)?,
        relay: output(p.gpio27.downgrade_output())?,
        red_led: output(p.gpio33.downgrade_output())?,
        green_led: output(p.gpio14.downgrade_output())?,
        activity_led: output(p.gpio2.downgrade_output())?,
        peer_signal: output(p.gpio26.downgrade_output())?,
    };
    info!(
        "Lines: button=GPIO{} detect=GPIO{} response=GPIO{} relay=GPIO{} signal=GPIO{}",
        pins::BUTTON_GPIO,
        pins::PEER_DETECT_GPIO,
        pins::PEER_RESPONSE_GPIO,
        pins::RELAY_GPIO,
        pins::PEER_SIGNAL_GPIO
    );

    // ── 4. Remaining adapters ─────────────────────────────────
    let sleep = LightSleep::new(pins::BUTTON_GPIO, &CONTROLLER)
        .map_err(|e| anyhow::anyhow!("light sleep setup: {}", e))?;
    let clock_sync = SntpClockSync::new(peripherals.modem, sysloop, Some(nvs_partition))
        .map_err(|e| anyhow::anyhow!("clock sync setup: {}", e))?;

    let mut board = Board {
        lines,
        time: Esp32TimeAdapter::new(config.utc_offset_minutes),
        watchdog: TaskWatchdog::new(),
        sleep,
        clock_sync,
    };
    let mut sink = LogEventSink::new();

    // ── 5. Run ────────────────────────────────────────────────
    let scheduler = PowerScheduler::new(GateService::new(&CONTROLLER, config));
    scheduler
        .run(&mut board, &mut sink)
        .map_err(|e| anyhow::anyhow!("scheduler: {}", e))?;

    info!("Gatelock stopped");
    Ok(())
}
