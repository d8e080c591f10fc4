//! CatToy firmware entry point.
//!
//! Composition root: builds the drivers and adapters, hands them to the
//! [`AppService`] and runs the control loop forever.
//!
//! ```text
//!   LSM6DSO ─I²C─▶ ToyHardware ◀─▶ AppService ──▶ HttpTelemetrySink ──▶ collector
//!                   │ motor           │
//!                   │ light ring      └──▶ LogEventSink ──▶ serial log
//!                   │ buzzer
//!   button ─ISR─▶ EventQueue ──▶ AppCommand
//!   console ─────────▲
//! ```

use anyhow::anyhow;
use esp_idf_hal::delay::{Delay, FreeRtos};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::TxRmtDriver;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use cattoy::adapters::console;
use cattoy::adapters::hardware::ToyHardware;
use cattoy::adapters::log_sink::LogEventSink;
use cattoy::adapters::nvs::NvsAdapter;
use cattoy::adapters::telemetry::HttpTelemetrySink;
use cattoy::adapters::time::Esp32TimeAdapter;
use cattoy::adapters::wifi::{ConnectivityPort, WifiAdapter};
use cattoy::app::ports::{Clock, ConfigPort, CredentialPort};
use cattoy::app::service::AppService;
use cattoy::config::ToyConfig;
use cattoy::drivers::button::ButtonDriver;
use cattoy::drivers::pixels::PixelStrip;
use cattoy::drivers::watchdog::Watchdog;
use cattoy::drivers::hw_init;
use cattoy::events;
use cattoy::pins;
use cattoy::sensors::lsm6dso::{Lsm6dso, DEFAULT_ADDRESS};

fn main() -> anyhow::Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║      CatToy v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("║      ESP32-S3 · LSM6DSO · L298N      ║");
    info!("╚══════════════════════════════════════╝");

    // ── 2. Raw peripheral setup (GPIO, LEDC, button ISR) ──────
    hw_init::init_peripherals().map_err(cattoy::error::Error::from)?;
    hw_init::init_isr_service().map_err(cattoy::error::Error::from)?;

    // ── 3. Configuration ──────────────────────────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init: {e}"))?;
    let config = match nvs.load() {
        Ok(c) => c,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            ToyConfig::default()
        }
    };
    info!(
        "Config: threshold={}g idle->hunt={}ms hunt->sleep={}ms loop={}ms",
        config.motion_threshold_g,
        config.idle_to_hunt_ms,
        config.hunt_to_sleep_ms,
        config.control_loop_interval_ms
    );

    // ── 4. HAL-owned buses ────────────────────────────────────
    let peripherals = Peripherals::take()?;

    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio11,
        peripherals.pins.gpio12,
        &i2c_config,
    )?;

    // 80 MHz RMT clock; WS2812 pulse widths are set in the pixel driver.
    let rmt_config = TransmitConfig::new().clock_divider(1);
    let tx = TxRmtDriver::new(peripherals.rmt.channel0, peripherals.pins.gpio15, &rmt_config)?;

    // ── 5. Toy hardware ───────────────────────────────────────
    // SAFETY: esp_random reads the hardware RNG; RF is up after link_patches.
    let seed = unsafe {
        (u64::from(esp_idf_svc::sys::esp_random()) << 32)
            | u64::from(esp_idf_svc::sys::esp_random())
    };
    let mut hw = ToyHardware::new(
        Lsm6dso::new(i2c, DEFAULT_ADDRESS),
        PixelStrip::new(tx),
        Delay::new_default(),
        StdRng::seed_from_u64(seed),
        &config,
    );
    if let Err(e) = hw.init() {
        // Keep running: reads fail soft to zero motion.
        warn!("Toy hardware init failed: {}", e);
    }

    let mut button = ButtonDriver::new(pins::BUTTON_GPIO);

    info!("Settling for {}ms", config.boot_settle_ms);
    FreeRtos::delay_ms(config.boot_settle_ms);

    // ── 6. Wi-Fi ──────────────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), None)?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?);

    let time = Esp32TimeAdapter::new();
    match nvs.wifi_credentials() {
        Ok(Some(creds)) => {
            if let Err(e) = wifi.set_credentials(&creds) {
                warn!("Stored Wi-Fi credentials rejected: {}", e);
            } else if let Err(e) = wifi.connect(time.now_ms()) {
                warn!("Wi-Fi connect failed: {} (will retry)", e);
            }
        }
        Ok(None) => warn!("No Wi-Fi credentials stored; telemetry will fail until provisioned"),
        Err(e) => warn!("Wi-Fi credential read failed: {}", e),
    }

    // ── 7. Telemetry ──────────────────────────────────────────
    let mut telemetry = HttpTelemetrySink::from_config(&config)
        .or_else(|e| {
            warn!("Telemetry target invalid ({}), using default collector", e);
            HttpTelemetrySink::from_config(&ToyConfig::default())
        })
        .map_err(cattoy::error::Error::from)?;

    // ── 8. Application service ────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config.clone());
    app.start(&time, &mut sink);

    // ── 9. Watchdog and console ───────────────────────────────
    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms);

    if let Err(e) = console::spawn_reader() {
        warn!("Console reader not started: {}", e);
    }
    let mut applied_revision = app.config_revision();

    info!("Entering control loop");

    // ── 10. Control loop ──────────────────────────────────────
    loop {
        if let Some(gesture) = button.tick(time.uptime_ms_u32()) {
            events::push_event(gesture.into());
        }

        events::drain_events(|event| {
            let cmd = event.into_command(app.current_config());
            app.handle_command(cmd, &time, &mut sink);
        });

        // Console edits take effect before the next actuation.
        if app.config_revision() != applied_revision {
            applied_revision = app.config_revision();
            hw.apply_config(app.current_config());
            match HttpTelemetrySink::from_config(app.current_config()) {
                Ok(t) => telemetry = t,
                Err(e) => warn!("Telemetry target unchanged ({})", e),
            }
        }

        app.tick(&mut hw, &time, &mut telemetry, &mut sink);

        let now = time.now_ms();
        wifi.poll(now);
        app.auto_save_if_needed(now, &nvs);

        watchdog.feed();
        FreeRtos::delay_ms(app.current_config().control_loop_interval_ms);
    }
}
