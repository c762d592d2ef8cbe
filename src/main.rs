//! SmartIron Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter    UptimeClock    │
//! │  (Sensor+Actuator) (EventSink)    (Config+NVS)                 │
//! │  NetworkAdapter    BlackBox       ConsoleReader                │
//! │  (Connectivity)    (EventSink)    (UART0 lines)                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  ModeArbiter · Predictor · Rules · SafetyPolicy        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use smartiron::adapters::blackbox::BlackBox;
use smartiron::adapters::console::ConsoleReader;
use smartiron::adapters::hardware::HardwareAdapter;
use smartiron::adapters::log_sink::LogEventSink;
use smartiron::adapters::network::{NetworkAdapter, REMOTE_MAILBOX};
use smartiron::adapters::nvs::NvsAdapter;
use smartiron::adapters::time::UptimeClock;
use smartiron::app::ports::{ActuatorPort, ConfigPort};
use smartiron::app::service::AppService;
use smartiron::config::SystemConfig;
use smartiron::drivers::display::Lcd1602;
use smartiron::drivers::hw_init;
use smartiron::drivers::outputs::HeaterOutputs;
use smartiron::pins;
use smartiron::sensors::SensorHub;
use smartiron::sensors::climate::{ClimateSensor, MIN_READ_INTERVAL_US};
use smartiron::sensors::reflectance::ReflectanceSensor;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SmartIron v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;

    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    let display = match Lcd1602::new(i2c, Ets, pins::LCD_I2C_ADDR) {
        Ok(lcd) => Some(lcd),
        Err(e) => {
            warn!("LCD init failed ({:?}), running headless", e);
            None
        }
    };

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    let net_config = nvs.load_network();

    // ── 4. Construct adapters ─────────────────────────────────
    let sensor_hub = SensorHub::new(
        ClimateSensor::new(pins::DHT_GPIO, MIN_READ_INTERVAL_US),
        ReflectanceSensor::new(config.ir_presence_threshold),
    );
    let mut hw = HardwareAdapter::new(sensor_hub, HeaterOutputs::new(), display);
    hw.all_off();
    hw.show_boot_screen();

    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition))?;
    let mut net = NetworkAdapter::new(
        net_config,
        config.reconnect_interval_ms,
        &REMOTE_MAILBOX,
        wifi,
    );

    let clock = UptimeClock::new();
    let mut sink = (LogEventSink::new(), BlackBox::new(nvs, clock));
    let mut console = ConsoleReader::new();

    // ── 5. Construct app service ──────────────────────────────
    let interval_ms = config.control_loop_interval_ms;
    let mut app = AppService::new(config);
    app.start(&mut sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let started_ms = clock.uptime_ms();

        if let Some(cmd) = console.poll() {
            app.handle_console(cmd, &mut sink);
        }

        app.tick(&mut hw, &mut net, &mut sink);

        let spent = clock.uptime_ms().saturating_sub(started_ms) as u32;
        FreeRtos::delay_ms(interval_ms.saturating_sub(spent).max(1));
    }
}
