//! ESP32-C3 SuperMini supply-voltage monitor.
//!
//! This is the main entry point for the physical hardware. It runs a 1 Hz
//! loop that:
//! - Ticks the acquisition state machine (rail up on first tick, then arm)
//! - Dispatches the conversion completion through the fast and slow paths
//! - Writes one `My Voltage = <mV>[mV]` line per second to UART0
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! ```

use esp_idf_hal::adc::oneshot::AdcDriver;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use log::{error, info};
use std::thread;
use std::time::Duration;
use supply_monitor::hal::esp32::{pins, Esp32Analog, UartSink};
use supply_monitor::{
    AcquisitionError, ConversionConfig, DeviceId, Divider, HwEventHandler, MonitorConfig,
    VoltageMonitor,
};

/// One-shot ADC resolution ceiling (12-bit)
const ESP32_MAX_CODE: u16 = 4095;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("supply-monitor starting");

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = MonitorConfig::default().with_conversion(
        ConversionConfig::default()
            .with_divider(Divider::SUPPLY)
            .with_max_code(ESP32_MAX_CODE),
    );

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Initialize UART0 (report output)
    // =========================================================================
    let uart = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio20,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(config.serial.baud_rate.Hz()),
    )?;
    info!(
        "UART0 ready at {} baud (TX GPIO{}, RX GPIO{})",
        config.serial.baud_rate,
        pins::UART_TX,
        pins::UART_RX
    );

    // =========================================================================
    // Initialize supply sense (ADC1 on GPIO1)
    // =========================================================================
    let adc1 = AdcDriver::new(peripherals.adc1)?;
    let analog = Esp32Analog::new(&adc1, peripherals.pins.gpio1);
    info!("supply sense on GPIO{}", pins::VSENSE);

    let mut monitor = VoltageMonitor::with_config(analog, UartSink::new(uart), &config);
    let period = Duration::from_millis(config.acquisition.period_ms as u64);

    // =========================================================================
    // Main Loop (1 Hz)
    // =========================================================================
    loop {
        match monitor.tick() {
            Ok(_) => {}
            Err(AcquisitionError::RailNeverStabilized { polls }) => {
                anyhow::bail!("analog rail never stabilized ({} polls)", polls);
            }
            Err(e) => error!("tick failed: {}", e),
        }

        // One-shot reads complete synchronously; dispatch as the IRQ would.
        if monitor.analog_mut().take_completion()
            && monitor.on_signal(DeviceId::Analogue, 0).runs_deferred()
        {
            if let Err(e) = monitor.on_complete(DeviceId::Analogue, 0) {
                error!("sample read failed: {}", e);
            }
        }

        thread::sleep(period);
    }
}
