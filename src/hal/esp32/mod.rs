//! ESP32-C3 SuperMini hardware abstraction layer for supply monitoring.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Sense**: supply through a 2:3 resistor divider into ADC1
//! - **Report**: UART0 (shared with the ESP-IDF console)
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod analog;
mod uart;

pub use analog::{Esp32Analog, Esp32AnalogError};
pub use uart::UartSink;

/// Pin assignments for SuperMini ESP32-C3.
pub mod pins {
    /// Supply sense input (ADC1 channel 1)
    pub const VSENSE: i32 = 1;

    /// UART0 transmit
    pub const UART_TX: i32 = 21;

    /// UART0 receive
    pub const UART_RX: i32 = 20;
}
