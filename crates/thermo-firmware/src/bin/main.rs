#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::timer::timg::TimerGroup;
use log::{error, info, warn};

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ILI9342CRgb565};

use thermo_core::app_state::{AppError, LinkState};
use thermo_core::config::TelemetryConfig;
use thermo_core::http::ServerState;
use thermo_core::scheduler::TelemetryLoop;
use thermo_firmware::config::Config;
use thermo_firmware::leds::RgbLeds;
use thermo_firmware::memory::EspHeap;
use thermo_firmware::net::SocketListener;
use thermo_firmware::panel::Panel;
use thermo_firmware::sht40::Sht40Sensor;
use thermo_firmware::{link, wifi};

const DISPLAY_WIDTH: u16 = 320;
const DISPLAY_HEIGHT: u16 = 240;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Log a startup failure and park; there is nothing useful left to run.
async fn halt(error: AppError) -> ! {
    error!("Startup failed: {}", error);
    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let config = TelemetryConfig::default();
    let mut telemetry: TelemetryLoop<SocketListener> = match TelemetryLoop::new(config) {
        Ok(telemetry) => telemetry,
        Err(e) => halt(e.into()).await,
    };

    // Network: a failed bring-up leaves the server absent but keeps sampling.
    let device = Config::from_build_env();
    let mut spare_listener = None;
    if device.internet.is_configured() {
        match wifi::start(&spawner, peripherals.WIFI, device.internet) {
            Ok(stack) => {
                spare_listener = SocketListener::new(stack, &telemetry.config().http);
            }
            Err(e) => error!("{}; running offline", e),
        }
    } else {
        warn!("No Wi-Fi credentials configured; running offline");
    }

    // SHT40 on Port A
    let i2c = match I2c::new(peripherals.I2C0, I2cConfig::default()) {
        Ok(i2c) => i2c
            .with_sda(peripherals.GPIO2)
            .with_scl(peripherals.GPIO1)
            .into_async(),
        Err(_) => halt(AppError::truncated(AppError::Sensor, "I2C bus init failed")).await,
    };
    let mut sensor = Sht40Sensor::new(i2c);

    // Indicator LEDs
    let mut leds = RgbLeds::new(
        Output::new(peripherals.GPIO5, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO6, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO7, Level::Low, OutputConfig::default()),
    );

    // Configure and initialize the display
    let spi_bus = match Spi::new(peripherals.SPI2, SpiConfig::default()) {
        Ok(spi) => spi
            .with_sck(peripherals.GPIO36)
            .with_mosi(peripherals.GPIO37),
        Err(_) => halt(AppError::truncated(AppError::Display, "SPI init failed")).await,
    };
    // The panel has no hardware CS line of its own
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());
    let Ok(spi_device) = ExclusiveDevice::new_no_delay(spi_bus, cs) else {
        halt(AppError::truncated(AppError::Display, "chip select init failed")).await
    };
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());
    let mut spi_buffer = [0u8; 64];
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);
    let display = match MipidsiBuilder::new(ILI9342CRgb565, di)
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .init(&mut embassy_time::Delay)
    {
        Ok(display) => display,
        Err(_) => halt(AppError::truncated(AppError::Display, "panel init failed")).await,
    };
    let mut panel = Panel::new(display, telemetry.config().display_shift_ticks);

    info!("Display initialized!");

    let heap = EspHeap;
    let mut ticker = Ticker::every(Duration::from_secs(telemetry.config().tick_secs as u64));

    loop {
        // Follow the Wi-Fi task: serve only while the link is up.
        if let Some(state) = link::take() {
            telemetry.set_link(state);
            match (state, telemetry.server_state()) {
                (LinkState::Up, ServerState::Absent) => {
                    if let Some(listener) = spare_listener.take() {
                        telemetry.attach_listener(listener);
                    }
                }
                (LinkState::Down, ServerState::Listening) => {
                    spare_listener = telemetry.detach_listener();
                }
                _ => {}
            }
        }

        telemetry
            .tick(&mut sensor, &heap, &mut panel, &mut leds)
            .await;

        ticker.next().await;
    }
}
